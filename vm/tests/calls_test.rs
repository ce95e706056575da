use std::rc::Rc;

use abc::{AbcFile, ClassInfo, InstanceInfo, MethodBody, MethodTrait, TraitInfo, TraitKind};
use memory::{ObjectRef, Value};
use vm::opcode::instruction::assemble;
use vm::{NativeRegistry, OpCode, RuntimeError, VmConfig, VM};

use OpCode::*;

/// Interns `names` into a fresh program's string table, returning the
/// program and the index of each name, in order.
fn with_strings(names: &[&str]) -> (AbcFile, Vec<i32>) {
    let mut file = AbcFile::new();
    let indices = names
        .iter()
        .map(|n| file.constant_pool.push_string(*n) as i32)
        .collect();
    (file, indices)
}

fn body(method: u32, local_count: u32, code: Vec<u8>) -> MethodBody {
    MethodBody {
        method,
        max_stack: 8,
        local_count,
        code,
        ..MethodBody::default()
    }
}

fn method_trait(name: i32, method: u32) -> TraitInfo {
    TraitInfo::new(name as u32, TraitKind::Method(MethodTrait { disp_id: 0, method }))
}

fn class(name: i32, super_name: i32, initializer: u32, traits: Vec<TraitInfo>) -> InstanceInfo {
    InstanceInfo {
        name: name as u32,
        super_name: super_name as u32,
        initializer,
        traits,
        ..InstanceInfo::default()
    }
}

fn greet(vm: &mut VM, this: Option<ObjectRef>, _args: &[Value]) -> Result<Value, RuntimeError> {
    let this = this.ok_or("greet needs a receiver")?;
    let name = vm.heap.get_property(this, "name").unwrap_or_default();
    let text = format!("Hello, {}!", vm.val_to_string(name));
    Ok(vm.heap.string_value(&text))
}

fn init_x(vm: &mut VM, this: Option<ObjectRef>, args: &[Value]) -> Result<Value, RuntimeError> {
    if let Some(obj) = this {
        vm.heap
            .set_property(obj, "x", args.first().copied().unwrap_or_default());
    }
    Ok(Value::Undefined)
}

fn mark_base(vm: &mut VM, this: Option<ObjectRef>, _args: &[Value]) -> Result<Value, RuntimeError> {
    if let Some(obj) = this {
        vm.heap.set_property(obj, "base", Value::Bool(true));
    }
    Ok(Value::Undefined)
}

// ============================================================================
// Method calls
// ============================================================================

#[test]
fn person_greet_native() {
    let (mut file, s) = with_strings(&["Person", "name", "Alice", "greet"]);
    let (person, name, alice, greet_name) = (s[0], s[1], s[2], s[3]);
    file.instances = vec![class(person, 0, 99, vec![])];
    file.classes = vec![ClassInfo::default()];
    file.method_bodies = vec![body(
        0,
        1,
        assemble(&[
            (GetLex, &[person]),
            (ConstructProp, &[]),
            (SetLocal0, &[]),
            (GetLocal0, &[]),
            (PushString, &[alice]),
            (SetProperty, &[name]),
            (Pop, &[]),
            (GetLocal0, &[]),
            (CallProp, &[greet_name, 0]),
            (ReturnValue, &[]),
        ]),
    )];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    let person_class = vm.class_named("Person").unwrap();
    vm.define_class_native(person_class, "greet", greet);

    let result = vm.run_method(0).unwrap();
    assert_eq!(vm.val_to_string(result), "Hello, Alice!");
}

#[test]
fn bytecode_method_binds_args_to_locals() {
    let (mut file, s) = with_strings(&["Calc", "sum"]);
    let (calc, sum) = (s[0], s[1]);
    file.instances = vec![class(calc, 0, 99, vec![method_trait(sum, 1)])];
    file.classes = vec![ClassInfo::default()];
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[
                (GetLex, &[calc]),
                (ConstructProp, &[]),
                (PushByte, &[4]),
                (PushByte, &[5]),
                (CallProp, &[sum, 2]),
                (ReturnValue, &[]),
            ]),
        ),
        body(
            1,
            2,
            assemble(&[
                (GetLocal0, &[]),
                (GetLocal1, &[]),
                (Subtract, &[]),
                (ReturnValue, &[]),
            ]),
        ),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Number(-1.0)));
}

#[test]
fn static_call_on_a_class() {
    let (mut file, s) = with_strings(&["Util", "seven"]);
    let (util, seven) = (s[0], s[1]);
    file.instances = vec![class(util, 0, 99, vec![])];
    file.classes = vec![ClassInfo {
        initializer: 99,
        traits: vec![method_trait(seven, 1)],
    }];
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[(GetLex, &[util]), (CallProp, &[seven, 0]), (ReturnValue, &[])]),
        ),
        body(1, 0, assemble(&[(PushByte, &[7]), (ReturnValue, &[])])),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Int(7)));
}

#[test]
fn callprop_on_missing_or_non_object_pushes_undefined() {
    let (mut file, s) = with_strings(&["nothing"]);
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[
                (PushByte, &[1]),
                (PushByte, &[2]),
                (CallProp, &[s[0], 1]),
                (ReturnValue, &[]),
            ]),
        ),
        body(
            1,
            0,
            assemble(&[
                (NewObject, &[0]),
                (CallProp, &[s[0], 0]),
                (ReturnValue, &[]),
            ]),
        ),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Undefined));
    assert_eq!(vm.run_method(1), Ok(Value::Undefined));
}

#[test]
fn callpropvoid_discards_the_result() {
    let (mut file, s) = with_strings(&["trace", "call"]);
    file.method_bodies = vec![body(
        0,
        0,
        assemble(&[
            (PushByte, &[1]),
            (GetLex, &[s[0]]),
            (PushByte, &[9]),
            (CallPropVoid, &[s[1], 1]),
        ]),
    )];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Undefined));
    assert_eq!(vm.stack, vec![Value::Int(1)]);
}

/// Body 0 calls `Loop.again`, which is body 0 itself.
fn endless_recursion() -> AbcFile {
    let (mut file, s) = with_strings(&["Loop", "again"]);
    let (looper, again) = (s[0], s[1]);
    file.instances = vec![class(looper, 0, 99, vec![])];
    file.classes = vec![ClassInfo {
        initializer: 99,
        traits: vec![method_trait(again, 0)],
    }];
    file.method_bodies = vec![body(
        0,
        0,
        assemble(&[(GetLex, &[looper]), (CallProp, &[again, 0]), (ReturnValue, &[])]),
    )];
    file
}

#[test]
fn recursion_hits_the_call_depth_limit() {
    let mut vm = VM::with_config(VmConfig {
        max_call_depth: 8,
        ..VmConfig::default()
    });
    vm.load_abc(Rc::new(endless_recursion())).unwrap();
    assert_eq!(
        vm.run_method(0),
        Err(RuntimeError::CallDepthExceeded { limit: 8 })
    );
    assert_eq!(vm.depth(), 0);
}

#[test]
fn default_call_depth_fits_a_spawned_thread() {
    let result = std::thread::spawn(|| {
        let mut vm = VM::new();
        vm.load_abc(Rc::new(endless_recursion())).unwrap();
        vm.run_method(0)
    })
    .join()
    .unwrap();
    assert_eq!(
        result,
        Err(RuntimeError::CallDepthExceeded {
            limit: vm::config::DEFAULT_MAX_CALL_DEPTH
        })
    );
}

fn run_body_two(
    vm: &mut VM,
    _this: Option<ObjectRef>,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    vm.run_method(2)
}

#[test]
fn nested_run_from_a_native_keeps_the_call_depth() {
    let (mut file, s) = with_strings(&["call", "nested"]);
    let (call, nested) = (s[0], s[1]);
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[(NewFunction, &[1]), (CallProp, &[call, 0]), (ReturnValue, &[])]),
        ),
        body(
            1,
            0,
            assemble(&[(GetLex, &[nested]), (CallProp, &[call, 0]), (ReturnValue, &[])]),
        ),
        body(2, 0, assemble(&[(PushByte, &[5]), (ReturnValue, &[])])),
    ];

    let mut vm = VM::new();
    vm.define_native("nested", run_body_two);
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Int(5)));
    assert_eq!(vm.depth(), 0);
}

#[test]
fn function_values_are_callable() {
    let (mut file, s) = with_strings(&["call"]);
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[
                (NewFunction, &[1]),
                (PushByte, &[20]),
                (CallProp, &[s[0], 1]),
                (ReturnValue, &[]),
            ]),
        ),
        body(
            1,
            1,
            assemble(&[(GetLocal0, &[]), (Increment, &[]), (ReturnValue, &[])]),
        ),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Number(21.0)));
}

#[test]
fn callprop_on_a_data_function_pushes_the_value() {
    let (mut file, s) = with_strings(&["f"]);
    let f = s[0];
    file.method_bodies = vec![
        body(
            0,
            1,
            assemble(&[
                (NewObject, &[0]),
                (SetLocal0, &[]),
                (GetLocal0, &[]),
                (NewFunction, &[1]),
                (SetProperty, &[f]),
                (Pop, &[]),
                (GetLocal0, &[]),
                (CallProp, &[f, 0]),
                (ReturnValue, &[]),
            ]),
        ),
        body(1, 0, assemble(&[(PushByte, &[42]), (ReturnValue, &[])])),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    let stored = vm.functions[1];
    assert_eq!(vm.run_method(0), Ok(Value::Function(stored)));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn construct_passes_arguments_to_the_constructor() {
    let (mut file, s) = with_strings(&["Point", "x"]);
    let (point, x) = (s[0], s[1]);
    file.instances = vec![class(point, 0, 99, vec![])];
    file.classes = vec![ClassInfo::default()];
    file.method_bodies = vec![body(
        0,
        0,
        assemble(&[
            (GetLex, &[point]),
            (PushByte, &[7]),
            (Construct, &[1]),
            (GetProperty, &[x]),
            (ReturnValue, &[]),
        ]),
    )];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    let point_class = vm.class_named("Point").unwrap();
    let ctor = vm.alloc_native("Point", init_x);
    vm.heap.get_class_mut(point_class).unwrap().constructor = Some(ctor);

    assert_eq!(vm.run_method(0), Ok(Value::Int(7)));
}

#[test]
fn constructed_objects_inherit_class_traits() {
    let (mut file, s) = with_strings(&["Base", "Derived", "who"]);
    let (base, derived, who) = (s[0], s[1], s[2]);
    file.instances = vec![
        class(base, 0, 99, vec![method_trait(who, 1)]),
        class(derived, base, 99, vec![]),
    ];
    file.classes = vec![ClassInfo::default(); 2];
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[
                (GetLex, &[derived]),
                (ConstructProp, &[]),
                (CallProp, &[who, 0]),
                (ReturnValue, &[]),
            ]),
        ),
        body(1, 0, assemble(&[(PushByte, &[42]), (ReturnValue, &[])])),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Int(42)));
}

#[test]
fn constructsuper_runs_the_parent_constructor() {
    let (mut file, s) = with_strings(&["Base", "Derived", "base"]);
    let (base, derived, base_flag) = (s[0], s[1], s[2]);
    file.instances = vec![class(base, 0, 99, vec![]), class(derived, base, 1, vec![])];
    file.classes = vec![ClassInfo::default(); 2];
    file.method_bodies = vec![
        body(
            0,
            0,
            assemble(&[
                (GetLex, &[derived]),
                (ConstructProp, &[]),
                (GetProperty, &[base_flag]),
                (ReturnValue, &[]),
            ]),
        ),
        body(1, 0, assemble(&[(PushNull, &[]), (ConstructSuper, &[0])])),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    let base_class = vm.class_named("Base").unwrap();
    let ctor = vm.alloc_native("Base", mark_base);
    vm.heap.get_class_mut(base_class).unwrap().constructor = Some(ctor);

    assert_eq!(vm.run_method(0), Ok(Value::Bool(true)));
}

#[test]
fn constructing_a_non_class_pushes_undefined() {
    let mut vm = VM::new();
    let code = assemble(&[(PushByte, &[1]), (ConstructProp, &[]), (ReturnValue, &[])]);
    assert_eq!(vm.run_code(&code), Ok(Value::Undefined));
}

#[test]
fn newclass_reuses_linked_classes() {
    let (mut file, s) = with_strings(&["Known", "Fresh"]);
    file.instances = vec![class(s[0], 0, 99, vec![])];
    file.classes = vec![ClassInfo::default()];
    file.method_bodies = vec![
        body(0, 0, assemble(&[(NewClass, &[s[0]]), (ReturnValue, &[])])),
        body(0, 0, assemble(&[(NewClass, &[s[1]]), (ReturnValue, &[])])),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Class(vm.classes[0])));
    let fresh = vm.run_method(1).unwrap();
    assert_eq!(vm.val_to_string(fresh), "[class Fresh]");
    assert_ne!(fresh, Value::Class(vm.classes[0]));
}

// ============================================================================
// Properties and enumeration
// ============================================================================

#[test]
fn property_access_on_non_objects_yields_undefined() {
    let (mut file, s) = with_strings(&["p"]);
    let p = s[0];
    file.method_bodies = vec![
        body(0, 0, assemble(&[(PushByte, &[1]), (GetProperty, &[p]), (ReturnValue, &[])])),
        body(
            1,
            0,
            assemble(&[
                (PushByte, &[1]),
                (PushByte, &[2]),
                (SetProperty, &[p]),
                (ReturnValue, &[]),
            ]),
        ),
        body(
            2,
            0,
            assemble(&[
                (NewObject, &[0]),
                (PushByte, &[2]),
                (InitProperty, &[p]),
                (ReturnValue, &[]),
            ]),
        ),
    ];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();
    assert_eq!(vm.run_method(0), Ok(Value::Undefined));
    assert_eq!(vm.run_method(1), Ok(Value::Undefined));
    assert_eq!(vm.run_method(2), Ok(Value::Int(2)));
}

#[test]
fn hasnext_walks_keys_in_insertion_order() {
    let (mut file, s) = with_strings(&["b", "a"]);
    let enumerate = |index: i32| {
        assemble(&[
            (PushString, &[s[0]]),
            (PushByte, &[1]),
            (PushString, &[s[1]]),
            (PushByte, &[2]),
            (NewObject, &[2]),
            (PushByte, &[index]),
            (HasNext2, &[]),
        ])
    };
    file.method_bodies = vec![body(0, 0, enumerate(1)), body(1, 0, enumerate(2))];

    let mut vm = VM::new();
    vm.load_abc(Rc::new(file)).unwrap();

    vm.run_method(0).unwrap();
    assert_eq!(vm.stack.len(), 3);
    assert_eq!(vm.stack[0], Value::Bool(true));
    assert_eq!(vm.val_to_string(vm.stack[1]), "a");
    assert_eq!(vm.stack[2], Value::Int(2));

    vm.run_method(1).unwrap();
    assert_eq!(vm.stack, vec![Value::Bool(false)]);
}

#[test]
fn hasnext_on_a_non_object_is_false() {
    let mut vm = VM::new();
    let code = assemble(&[(PushNull, &[]), (PushByte, &[0]), (HasNext, &[]), (ReturnValue, &[])]);
    assert_eq!(vm.run_code(&code), Ok(Value::Bool(false)));
}

#[test]
fn scope_ops_keep_the_operand_stack_balanced() {
    let mut vm = VM::new();
    let code = assemble(&[
        (PushByte, &[5]),
        (NewObject, &[0]),
        (PushScope, &[]),
        (PopScope, &[]),
        (ReturnValue, &[]),
    ]);
    assert_eq!(vm.run_code(&code), Ok(Value::Int(5)));
}
