/// Tests for jumps, loop blocks and iteration.
///
/// Stack depths are observed through a `RecordingTracer`, which reports the
/// operand stack size before every instruction.
use bytepy::{
    CodeBuilder, CodeObject, CompareOp, NoLimitTracker, NoPrint, Opcode, RecordingTracer, RunResult, Runner,
    TraceEvent, Value,
};
use pretty_assertions::assert_eq;

fn run(code: CodeObject) -> RunResult<Value> {
    Runner::new(code).run(NoLimitTracker, &mut NoPrint)
}

/// Runs `code` and returns its result with the `(opcode, stack_depth)` of every instruction.
fn run_recorded(code: CodeObject) -> (RunResult<Value>, Vec<(Opcode, usize)>) {
    let (result, tracer) = Runner::new(code).run_traced(NoLimitTracker, &mut NoPrint, RecordingTracer::new());
    let steps = tracer
        .into_events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::Instruction {
                opcode, stack_depth, ..
            } => Some((opcode, stack_depth)),
            _ => None,
        })
        .collect();
    (result, steps)
}

/// Stack depth seen by the final `RETURN_VALUE`.
fn depth_at_return(steps: &[(Opcode, usize)]) -> usize {
    steps
        .iter()
        .rev()
        .find(|(op, _)| *op == Opcode::ReturnValue)
        .map(|(_, depth)| *depth)
        .unwrap()
}

fn count(steps: &[(Opcode, usize)], opcode: Opcode) -> usize {
    steps.iter().filter(|(op, _)| *op == opcode).count()
}

/// `lhs <op> rhs` for the short-circuit jumps: `LOAD lhs; JUMP_IF_*_OR_POP end; LOAD rhs; end: RETURN_VALUE`.
fn short_circuit(op: Opcode, lhs: Value, rhs: Value) -> CodeObject {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(lhs);
    let end = b.emit_jump(op);
    b.load_const(rhs);
    b.patch_jump(end);
    b.emit(Opcode::ReturnValue);
    b.build()
}

/// `and`: a false left side jumps and stays on the stack; a true one is popped.
#[test]
fn jump_if_false_or_pop() {
    let (result, steps) = run_recorded(short_circuit(Opcode::JumpIfFalseOrPop, Value::Int(0), Value::Int(5)));
    assert_eq!(result.unwrap(), Value::Int(0));
    assert_eq!(depth_at_return(&steps), 1);
    assert_eq!(count(&steps, Opcode::LoadConst), 1);

    let (result, steps) = run_recorded(short_circuit(Opcode::JumpIfFalseOrPop, Value::Int(3), Value::Int(5)));
    assert_eq!(result.unwrap(), Value::Int(5));
    assert_eq!(depth_at_return(&steps), 1);
    assert_eq!(count(&steps, Opcode::LoadConst), 2);
}

/// `or`: the mirror image.
#[test]
fn jump_if_true_or_pop() {
    let (result, steps) = run_recorded(short_circuit(Opcode::JumpIfTrueOrPop, Value::from("x"), Value::Int(5)));
    assert_eq!(result.unwrap(), Value::from("x"));
    assert_eq!(depth_at_return(&steps), 1);

    let (result, steps) = run_recorded(short_circuit(Opcode::JumpIfTrueOrPop, Value::from(""), Value::Int(5)));
    assert_eq!(result.unwrap(), Value::Int(5));
    assert_eq!(depth_at_return(&steps), 1);
}

#[test]
fn pop_jump_if_true_always_pops() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::from("marker"));
    b.load_const(Value::Int(1));
    let taken = b.emit_jump(Opcode::PopJumpIfTrue);
    b.load_const(Value::from("not taken"));
    b.emit(Opcode::ReturnValue);
    b.patch_jump(taken);
    b.emit(Opcode::ReturnValue);
    let (result, steps) = run_recorded(b.build());
    assert_eq!(result.unwrap(), Value::from("marker"));
    assert_eq!(depth_at_return(&steps), 1);
}

/// `JUMP_FORWARD` counts from the end of its own instruction.
#[test]
fn jump_forward_skips_code() {
    let mut b = CodeBuilder::new("<module>");
    let skip = b.emit_jump(Opcode::JumpForward);
    b.load_const(Value::from("skipped"));
    b.emit(Opcode::ReturnValue);
    b.patch_jump(skip);
    b.load_const(Value::from("reached"));
    b.emit(Opcode::ReturnValue);
    assert_eq!(run(b.build()).unwrap(), Value::from("reached"));
}

/// ```text
/// i = 0
/// while i < 5:
///     i += 1
/// return i
/// ```
#[test]
fn while_loop_counts_up() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(0));
    b.emit_name(Opcode::StoreName, "i");
    let setup = b.emit_jump(Opcode::SetupLoop);
    let loop_start = b.current_offset();
    b.emit_name(Opcode::LoadName, "i");
    b.load_const(Value::Int(5));
    b.compare(CompareOp::Lt);
    let exit = b.emit_jump(Opcode::PopJumpIfFalse);
    b.emit_name(Opcode::LoadName, "i");
    b.load_const(Value::Int(1));
    b.emit(Opcode::InplaceAdd);
    b.emit_name(Opcode::StoreName, "i");
    b.emit_jump_to(Opcode::JumpAbsolute, loop_start);
    b.patch_jump(exit);
    b.emit(Opcode::PopBlock);
    b.patch_jump(setup);
    b.emit_name(Opcode::LoadName, "i");
    b.emit(Opcode::ReturnValue);
    assert_eq!(run(b.build()).unwrap(), Value::Int(5));
}

/// ```text
/// total = 0
/// for x in [items...]:
///     total += x
/// return total
/// ```
fn sum_loop(items: &[i64]) -> CodeObject {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(0));
    b.emit_name(Opcode::StoreName, "total");
    let setup = b.emit_jump(Opcode::SetupLoop);
    for &i in items {
        b.load_const(Value::Int(i));
    }
    b.emit_arg(Opcode::BuildList, u32::try_from(items.len()).unwrap());
    b.emit(Opcode::GetIter);
    let loop_start = b.current_offset();
    let exhausted = b.emit_jump(Opcode::ForIter);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::LoadName, "total");
    b.emit_name(Opcode::LoadName, "x");
    b.emit(Opcode::InplaceAdd);
    b.emit_name(Opcode::StoreName, "total");
    b.emit_jump_to(Opcode::JumpAbsolute, loop_start);
    b.patch_jump(exhausted);
    b.emit(Opcode::PopBlock);
    b.patch_jump(setup);
    b.emit_name(Opcode::LoadName, "total");
    b.emit(Opcode::ReturnValue);
    b.build()
}

/// `FOR_ITER` runs once per element plus once to pop the exhausted iterator.
#[test]
fn for_loop_over_list() {
    let (result, steps) = run_recorded(sum_loop(&[1, 2, 3]));
    assert_eq!(result.unwrap(), Value::Int(6));
    assert_eq!(count(&steps, Opcode::ForIter), 4);
    // iterator on the stack while FOR_ITER runs
    assert!(
        steps
            .iter()
            .filter(|(op, _)| *op == Opcode::ForIter)
            .all(|(_, depth)| *depth == 1)
    );
    assert_eq!(depth_at_return(&steps), 1);
}

/// An empty sequence: one `FOR_ITER` that pops the iterator and jumps, no body.
#[test]
fn for_loop_over_empty_list() {
    let (result, steps) = run_recorded(sum_loop(&[]));
    assert_eq!(result.unwrap(), Value::Int(0));
    assert_eq!(count(&steps, Opcode::ForIter), 1);
    assert_eq!(count(&steps, Opcode::InplaceAdd), 0);
    assert_eq!(count(&steps, Opcode::JumpAbsolute), 0);

    let for_iter = steps.iter().position(|(op, _)| *op == Opcode::ForIter).unwrap();
    assert_eq!(steps[for_iter], (Opcode::ForIter, 1));
    // the next instruction is the loop exit, with the iterator gone
    assert_eq!(steps[for_iter + 1], (Opcode::PopBlock, 0));
    assert_eq!(depth_at_return(&steps), 1);
}

/// ```text
/// for c in "abc":
///     print c,
/// print
/// ```
#[test]
fn for_loop_over_string_prints_characters() {
    let mut b = CodeBuilder::new("<module>");
    let setup = b.emit_jump(Opcode::SetupLoop);
    b.load_const(Value::from("abc"));
    b.emit(Opcode::GetIter);
    let loop_start = b.current_offset();
    let exhausted = b.emit_jump(Opcode::ForIter);
    b.emit(Opcode::PrintItem);
    b.emit_jump_to(Opcode::JumpAbsolute, loop_start);
    b.patch_jump(exhausted);
    b.emit(Opcode::PopBlock);
    b.patch_jump(setup);
    b.emit(Opcode::PrintNewline);
    b.load_const(Value::None);
    b.emit(Opcode::ReturnValue);

    let mut output = bytepy::CollectStringPrint::new();
    Runner::new(b.build()).run(NoLimitTracker, &mut output).unwrap();
    assert_eq!(output.output(), "abc\n");
}

/// `BREAK_LOOP` drops whatever the body left behind, the iterator included.
///
/// ```text
/// for i in range(10):
///     if i == 3:
///         break
/// return i
/// ```
#[test]
fn break_loop_truncates_to_entry_depth() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::from("below the loop"));
    let setup = b.emit_jump(Opcode::SetupLoop);
    b.emit_name(Opcode::LoadName, "range");
    b.load_const(Value::Int(10));
    b.call_function(1, 0);
    b.emit(Opcode::GetIter);
    let loop_start = b.current_offset();
    let exhausted = b.emit_jump(Opcode::ForIter);
    b.emit_name(Opcode::StoreName, "i");
    b.emit_name(Opcode::LoadName, "i");
    b.load_const(Value::Int(3));
    b.compare(CompareOp::Eq);
    let next = b.emit_jump(Opcode::PopJumpIfFalse);
    // leave garbage on the stack for BREAK_LOOP to discard
    b.load_const(Value::from("garbage"));
    b.emit(Opcode::BreakLoop);
    b.patch_jump(next);
    b.emit_jump_to(Opcode::JumpAbsolute, loop_start);
    b.patch_jump(exhausted);
    b.emit(Opcode::PopBlock);
    b.patch_jump(setup);
    b.emit(Opcode::PopTop);
    b.emit_name(Opcode::LoadName, "i");
    b.emit(Opcode::ReturnValue);

    let (result, steps) = run_recorded(b.build());
    assert_eq!(result.unwrap(), Value::Int(3));
    assert_eq!(count(&steps, Opcode::BreakLoop), 1);
    assert_eq!(count(&steps, Opcode::PopBlock), 0);
    let pop_top_depth = steps.iter().find(|(op, _)| *op == Opcode::PopTop).map(|(_, d)| *d);
    assert_eq!(pop_top_depth, Some(1));
}

/// ```text
/// total = 0
/// for x in [1, 2, 3, 4]:
///     if x % 2 == 0:
///         continue
///     total += x
/// return total
/// ```
#[test]
fn continue_loop_jumps_to_loop_start() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(0));
    b.emit_name(Opcode::StoreName, "total");
    let setup = b.emit_jump(Opcode::SetupLoop);
    for i in 1..=4 {
        b.load_const(Value::Int(i));
    }
    b.emit_arg(Opcode::BuildList, 4);
    b.emit(Opcode::GetIter);
    let loop_start = b.current_offset();
    let exhausted = b.emit_jump(Opcode::ForIter);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::LoadName, "x");
    b.load_const(Value::Int(2));
    b.emit(Opcode::BinaryModulo);
    b.load_const(Value::Int(0));
    b.compare(CompareOp::Eq);
    let odd = b.emit_jump(Opcode::PopJumpIfFalse);
    b.emit_jump_to(Opcode::ContinueLoop, loop_start);
    b.patch_jump(odd);
    b.emit_name(Opcode::LoadName, "total");
    b.emit_name(Opcode::LoadName, "x");
    b.emit(Opcode::InplaceAdd);
    b.emit_name(Opcode::StoreName, "total");
    b.emit_jump_to(Opcode::JumpAbsolute, loop_start);
    b.patch_jump(exhausted);
    b.emit(Opcode::PopBlock);
    b.patch_jump(setup);
    b.emit_name(Opcode::LoadName, "total");
    b.emit(Opcode::ReturnValue);
    assert_eq!(run(b.build()).unwrap(), Value::Int(4));
}

#[test]
fn block_opcodes_outside_a_loop_fail() {
    for op in [Opcode::PopBlock, Opcode::BreakLoop] {
        let mut b = CodeBuilder::new("<module>");
        b.emit(op);
        assert_eq!(run(b.build()).unwrap_err().kind(), "BlockStackUnderflow", "{op}");
    }
    let mut b = CodeBuilder::new("<module>");
    b.emit_jump_to(Opcode::ContinueLoop, 0);
    assert_eq!(run(b.build()).unwrap_err().kind(), "BlockStackUnderflow");
}

#[test]
fn iteration_errors() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(1));
    b.emit(Opcode::GetIter);
    assert_eq!(run(b.build()).unwrap_err().kind(), "NotIterable");

    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(1));
    let _ = b.emit_jump(Opcode::ForIter);
    assert_eq!(run(b.build()).unwrap_err().kind(), "TypeMismatch");
}

/// Immediates wider than 16 bits are carried by an `EXTENDED_ARG` prefix.
#[test]
fn extended_arg_widens_the_next_immediate() {
    let mut b = CodeBuilder::new("<module>");
    for _ in 0..70_000 {
        b.add_const(Value::None);
    }
    b.load_const(Value::Int(42));
    b.emit(Opcode::ReturnValue);
    let code = b.build();
    assert_eq!(code.bytecode()[0], Opcode::ExtendedArg as u8);
    assert_eq!(run(code).unwrap(), Value::Int(42));
}

#[test]
fn stack_rotations() {
    let rotated = |op: Opcode, n: u32| {
        let mut b = CodeBuilder::new("<module>");
        for i in 1..=i64::from(n) {
            b.load_const(Value::Int(i));
        }
        b.emit(op);
        b.emit_arg(Opcode::BuildList, n);
        b.emit(Opcode::ReturnValue);
        run(b.build()).unwrap()
    };
    let ints = |items: &[i64]| Value::from(items.iter().copied().map(Value::Int).collect::<Vec<_>>());
    assert_eq!(rotated(Opcode::RotTwo, 2), ints(&[2, 1]));
    assert_eq!(rotated(Opcode::RotThree, 3), ints(&[3, 1, 2]));
    assert_eq!(rotated(Opcode::RotFour, 4), ints(&[4, 1, 2, 3]));
    assert_eq!(rotated(Opcode::Nop, 2), ints(&[1, 2]));
}

/// `RETURN_VALUE` in the outermost frame hands the value to the driver.
#[test]
fn return_value_at_outermost_frame() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::from("done"));
    b.emit(Opcode::ReturnValue);
    b.load_const(Value::from("unreachable"));
    let (result, steps) = run_recorded(b.build());
    assert_eq!(result.unwrap(), Value::from("done"));
    assert_eq!(steps.len(), 2);
}
