use std::rc::Rc;

use abc::{AbcFile, MethodBody};
use memory::Value;
use vm::opcode::instruction::assemble;
use vm::{OpCode, VM};

use OpCode::*;

/// Links a program with one body per code sequence and the given strings.
fn vm_with(strings: &[&str], bodies: Vec<Vec<u8>>) -> VM {
    let mut file = AbcFile::new();
    for s in strings {
        file.constant_pool.push_string(*s);
    }
    file.method_bodies = bodies
        .into_iter()
        .enumerate()
        .map(|(i, code)| MethodBody {
            method: i as u32,
            max_stack: 8,
            local_count: 2,
            code,
            ..MethodBody::default()
        })
        .collect();
    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    vm
}

#[test]
fn stdlib_globals_are_bound_on_creation() {
    let vm = VM::new();
    for name in ["trace", "Math", "Date", "Array"] {
        assert!(vm.globals.contains(name), "{name}");
    }
    assert!(matches!(vm.globals.get("trace"), Some(Value::Function(_))));
    assert!(matches!(vm.globals.get("Math"), Some(Value::Object(_))));
    assert!(matches!(vm.globals.get("Date"), Some(Value::Class(_))));
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn math_pi_and_functions() {
    // 1: Math, 2: PI, 3: max, 4: min, 5: sqrt, 6: floor, 7: abs
    let mut vm = vm_with(
        &["Math", "PI", "max", "min", "sqrt", "floor", "abs"],
        vec![
            assemble(&[(GetLex, &[1]), (GetProperty, &[2]), (ReturnValue, &[])]),
            assemble(&[
                (GetLex, &[1]),
                (PushByte, &[3]),
                (PushByte, &[9]),
                (PushByte, &[-4]),
                (CallProp, &[3, 3]),
                (ReturnValue, &[]),
            ]),
            assemble(&[
                (GetLex, &[1]),
                (PushByte, &[3]),
                (PushByte, &[-4]),
                (CallProp, &[4, 2]),
                (ReturnValue, &[]),
            ]),
            assemble(&[(GetLex, &[1]), (PushByte, &[81]), (CallProp, &[5, 1]), (ReturnValue, &[])]),
            assemble(&[(GetLex, &[1]), (PushNaN, &[]), (CallProp, &[6, 1]), (ReturnValue, &[])]),
            assemble(&[(GetLex, &[1]), (PushByte, &[-6]), (CallProp, &[7, 1]), (ReturnValue, &[])]),
            assemble(&[(GetLex, &[1]), (CallProp, &[3, 0]), (ReturnValue, &[])]),
        ],
    );

    assert_eq!(vm.run_method(0), Ok(Value::Number(std::f64::consts::PI)));
    assert_eq!(vm.run_method(1), Ok(Value::Number(9.0)));
    assert_eq!(vm.run_method(2), Ok(Value::Number(-4.0)));
    assert_eq!(vm.run_method(3), Ok(Value::Number(9.0)));
    assert!(matches!(vm.run_method(4), Ok(Value::Number(n)) if n.is_nan()));
    assert_eq!(vm.run_method(5), Ok(Value::Number(6.0)));
    assert_eq!(vm.run_method(6), Ok(Value::Number(f64::NEG_INFINITY)));
}

#[test]
fn math_sin_of_a_numeric_string() {
    let mut vm = vm_with(
        &["Math", "sin", "0abc"],
        vec![assemble(&[
            (GetLex, &[1]),
            (PushString, &[3]),
            (CallProp, &[2, 1]),
            (ReturnValue, &[]),
        ])],
    );
    assert_eq!(vm.run_method(0), Ok(Value::Number(0.0)));
}

// ============================================================================
// Date and Array
// ============================================================================

#[test]
fn date_now_is_milliseconds_since_epoch() {
    let mut vm = vm_with(
        &["Date", "now"],
        vec![assemble(&[(GetLex, &[1]), (CallProp, &[2, 0]), (ReturnValue, &[])])],
    );
    match vm.run_method(0) {
        // 2020-01-01T00:00:00Z
        Ok(Value::Number(ms)) => assert!(ms > 1_577_836_800_000.0, "{ms}"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn array_push_uses_numeric_keys() {
    // 1: Array, 2: push, 3: length, 4: "1"
    let mut vm = vm_with(
        &["Array", "push", "length", "1"],
        vec![assemble(&[
            (GetLex, &[1]),
            (ConstructProp, &[]),
            (SetLocal0, &[]),
            (GetLocal0, &[]),
            (PushByte, &[5]),
            (PushByte, &[6]),
            (CallProp, &[2, 2]),
            (SetLocal1, &[]),
            (GetLocal0, &[]),
            (PushByte, &[7]),
            (CallPropVoid, &[2, 1]),
            (GetLocal0, &[]),
            (GetProperty, &[3]),
            (GetLocal0, &[]),
            (GetProperty, &[4]),
            (GetLocal1, &[]),
        ])],
    );

    assert_eq!(vm.run_method(0), Ok(Value::Undefined));
    assert_eq!(vm.stack, vec![Value::Int(3), Value::Int(6), Value::Int(2)]);
}

#[test]
fn trace_returns_undefined() {
    let mut vm = vm_with(
        &["trace", "call", "hello"],
        vec![assemble(&[
            (GetLex, &[1]),
            (PushString, &[3]),
            (PushByte, &[1]),
            (CallProp, &[2, 2]),
            (ReturnValue, &[]),
        ])],
    );
    assert_eq!(vm.run_method(0), Ok(Value::Undefined));
}
