use memory::{Object, ObjectRef, PropertySlot, TraitDescriptor, Value};

use crate::error::RuntimeError;
use crate::machine::{ArithmeticOps, NativeRegistry, VM};
use crate::native::NativeFn;

/// Allocates the `Math` object: `PI` as data, functions as method traits.
pub fn build(vm: &mut VM) -> ObjectRef {
    let mut math = Object::new();
    math.properties.insert(
        "PI".to_string(),
        PropertySlot::Value(Value::Number(std::f64::consts::PI)),
    );
    let math = vm.heap.alloc_object(math);

    let functions: [(&str, NativeFn); 7] = [
        ("sin", native_sin),
        ("cos", native_cos),
        ("sqrt", native_sqrt),
        ("floor", native_floor),
        ("abs", native_abs),
        ("max", native_max),
        ("min", native_min),
    ];
    for (name, func) in functions {
        let f = vm.alloc_native(name, func);
        vm.heap.define_trait(math, TraitDescriptor::method(name, f));
    }
    math
}

fn first_arg(vm: &VM, args: &[Value]) -> f64 {
    args.first().map_or(0.0, |&a| vm.to_number(a))
}

macro_rules! unary_math {
    ($name:ident, $op:ident) => {
        pub fn $name(
            vm: &mut VM,
            _this: Option<ObjectRef>,
            args: &[Value],
        ) -> Result<Value, RuntimeError> {
            Ok(Value::Number(first_arg(vm, args).$op()))
        }
    };
}

unary_math!(native_sin, sin);
unary_math!(native_cos, cos);
unary_math!(native_sqrt, sqrt);
unary_math!(native_floor, floor);
unary_math!(native_abs, abs);

/// Largest argument; `-Infinity` with none, NaN if any argument is NaN.
pub fn native_max(
    vm: &mut VM,
    _this: Option<ObjectRef>,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Number(fold(vm, args, f64::NEG_INFINITY, f64::max)))
}

/// Smallest argument; `Infinity` with none, NaN if any argument is NaN.
pub fn native_min(
    vm: &mut VM,
    _this: Option<ObjectRef>,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Number(fold(vm, args, f64::INFINITY, f64::min)))
}

fn fold(vm: &VM, args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for &arg in args {
        let n = vm.to_number(arg);
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}
