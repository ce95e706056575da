use std::time::{SystemTime, UNIX_EPOCH};

use memory::{Class, ObjectRef, Value};
use tracing::debug;

use crate::error::RuntimeError;
use crate::machine::{ArithmeticOps, GlobalOps, NativeRegistry, VM};

/// Binds `trace`, `Math`, `Date` and `Array` as globals.
pub fn bind(vm: &mut VM) {
    vm.define_native("trace", native_trace);

    let math = super::math::build(vm);
    vm.define_global("Math", Value::Object(math));

    let date = vm.heap.alloc_class(Class::new("Date"));
    vm.define_class_native(date, "now", native_date_now);
    vm.define_global("Date", Value::Class(date));

    let array = vm.heap.alloc_class(Class::new("Array"));
    vm.define_class_native(array, "push", native_array_push);
    vm.define_global("Array", Value::Class(array));

    debug!(globals = vm.globals.len(), "stdlib bound");
}

/// Prints its arguments, space separated, on one line.
pub fn native_trace(
    vm: &mut VM,
    _this: Option<ObjectRef>,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(|&arg| vm.val_to_string(arg))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    Ok(Value::Undefined)
}

/// Milliseconds since the Unix epoch.
pub fn native_date_now(
    _vm: &mut VM,
    _this: Option<ObjectRef>,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| RuntimeError::Native(format!("Date.now: {e}")))?
        .as_millis();
    Ok(Value::Number(millis as f64))
}

/// Appends each argument under the next numeric key and returns the new
/// `length`.
pub fn native_array_push(
    vm: &mut VM,
    this: Option<ObjectRef>,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let this = this.ok_or("Array.push called without a receiver")?;
    let current = vm.heap.get_property(this, "length").unwrap_or_default();
    let mut length = vm.to_number(current).max(0.0) as i32;

    for &arg in args {
        vm.heap.set_property(this, &length.to_string(), arg);
        length += 1;
    }
    vm.heap.set_property(this, "length", Value::Int(length));
    Ok(Value::Int(length))
}
