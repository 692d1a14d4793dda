#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltlab_core::component::ComponentKind;
use voltlab_core::id::{ComponentId, WireId};
use voltlab_core::test_utils::*;
use voltlab_core::wire::WireSpec;

/// A structured mutation operation for fuzzing.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Add { kind: u8 },
    Remove { index: u8 },
    Connect { from: u8, to: u8 },
    Disconnect { index: u8 },
    Toggle { index: u8 },
    Step,
}

/// Top-level fuzz input: a sequence of operations.
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    let mut c = control();
    let mut ids: Vec<ComponentId> = Vec::new();
    let mut wires: Vec<WireId> = Vec::new();

    // Limit operations to prevent timeouts.
    let max_ops = input.ops.len().min(200);

    for op in &input.ops[..max_ops] {
        match op {
            FuzzOp::Add { kind } => {
                let kind = ComponentKind::ALL[(*kind as usize) % ComponentKind::ALL.len()];
                ids.push(add(&mut c, kind));
            }
            FuzzOp::Remove { index } => {
                if !ids.is_empty() {
                    let idx = (*index as usize) % ids.len();
                    let id = ids.remove(idx);
                    let _ = c.remove(id);
                    wires.retain(|w| c.network.wire(*w).is_some());
                }
            }
            FuzzOp::Connect { from, to } => {
                if ids.len() >= 2 {
                    let from_idx = (*from as usize) % ids.len();
                    let to_idx = (*to as usize) % ids.len();
                    if from_idx != to_idx
                        && let Ok(wire) =
                            c.connect(ids[from_idx], ids[to_idx], Vec::new(), WireSpec::ideal())
                    {
                        wires.push(wire);
                    }
                }
            }
            FuzzOp::Disconnect { index } => {
                if !wires.is_empty() {
                    let idx = (*index as usize) % wires.len();
                    let wire = wires.remove(idx);
                    let _ = c.disconnect(wire);
                }
            }
            FuzzOp::Toggle { index } => {
                if !ids.is_empty() {
                    let id = ids[(*index as usize) % ids.len()];
                    if c.toggle_switch(id).is_err() {
                        let _ = c.toggle_branch(id);
                    }
                }
            }
            FuzzOp::Step => {
                let _ = c.step();
            }
        }
    }
});
