//! The sampled harness programs, rebuilt through the public API:
//! diagnostic printing, recursive fibonacci, field access, type tests,
//! numeric widening, and static-initializer accumulation.

use sable_engine::{ClassDef, RuntimeError, TypeTag, Value};

use super::harness::*;

#[test]
fn test_print_dispatch_selects_kind_entries() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    vm.invoke_static_by_name("Console", "println", &[Value::text("hello world")])
        .unwrap();
    vm.invoke_static_by_name("Console", "println", &[Value::I64(1000)])
        .unwrap();
    vm.invoke_static_by_name("Console", "println", &[Value::I64(-1000)])
        .unwrap();

    assert_eq!(*out.lock(), "hello world\n1000\n-1000\n");
}

#[test]
fn test_print_dispatch_covers_every_kind() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    vm.invoke_static_by_name("Console", "print", &[Value::I32(7)])
        .unwrap();
    vm.invoke_static_by_name("Console", "print", &[Value::I64(9_000_000_000)])
        .unwrap();
    vm.invoke_static_by_name("Console", "print", &[Value::F32(2.5)])
        .unwrap();
    vm.invoke_static_by_name("Console", "print", &[Value::F64(-0.25)])
        .unwrap();

    assert_eq!(*out.lock(), "790000000002.5-0.25");
}

#[test]
fn test_i64_argument_never_falls_to_i32_entry() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    // A value outside i32 range prints exactly; the i64 native entry
    // handled it, not a truncating fallback.
    vm.invoke_static_by_name("Console", "print", &[Value::I64(3_000_000_000)])
        .unwrap();
    assert_eq!(*out.lock(), "3000000000");
}

fn register_fibonacci(vm: &mut sable_engine::Vm) {
    vm.register_class(ClassDef::new("Fibonacci").static_method(
        "fibonacci",
        &[TypeTag::I64],
        |vm, frame| {
            let n = frame.arg_i64(0)?;
            if n <= 1 {
                return Ok(Value::I64(n));
            }
            let a = vm.invoke_static_by_name("Fibonacci", "fibonacci", &[Value::I64(n - 1)])?;
            let b = vm.invoke_static_by_name("Fibonacci", "fibonacci", &[Value::I64(n - 2)])?;
            a.add(&b)
        },
    ))
    .unwrap();
}

#[test]
fn test_recursive_fibonacci() {
    let (mut vm, _) = capture_vm();
    register_fibonacci(&mut vm);

    for (n, expected) in [(0, 0), (1, 1), (10, 55), (30, 832_040)] {
        let result = vm
            .invoke_static_by_name("Fibonacci", "fibonacci", &[Value::I64(n)])
            .unwrap();
        assert_eq!(result, Value::I64(expected), "fibonacci({})", n);
    }
    assert_eq!(vm.call_depth(), 0);
}

#[test]
fn test_fibonacci_prints_through_console() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);
    register_fibonacci(&mut vm);

    let x = vm
        .invoke_static_by_name("Fibonacci", "fibonacci", &[Value::I64(20)])
        .unwrap();
    vm.invoke_static_by_name("Console", "println", &[x]).unwrap();

    assert_eq!(*out.lock(), "6765\n");
}

#[test]
fn test_mixed_width_addition_widens() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("Math").static_method(
        "add",
        &[TypeTag::I32, TypeTag::I64],
        |_, frame| frame.arg(0).add(frame.arg(1)),
    ))
    .unwrap();

    let sum = vm
        .invoke_static_by_name(
            "Math",
            "add",
            &[Value::I32(32768), Value::I64(3_000_000_000)],
        )
        .unwrap();
    assert_eq!(sum, Value::I64(3_000_032_768));
}

#[test]
fn test_static_and_instance_field_access() {
    let (mut vm, _) = capture_vm();
    vm.register_class(
        ClassDef::new("MyObject")
            .static_field("staticVar", TypeTag::I32)
            .instance_field("instanceVar", TypeTag::I32),
    )
    .unwrap();

    let obj = vm.invoke_constructor_by_name("MyObject", &[]).unwrap();

    // Static access through an instance reference lands in class storage.
    vm.write_field(&obj, "staticVar", Value::I32(1)).unwrap();
    assert_eq!(vm.read_field(&obj, "staticVar").unwrap(), Value::I32(1));
    let class = vm.class_id("MyObject").unwrap();
    assert_eq!(vm.read_static(class, "staticVar").unwrap(), Value::I32(1));

    vm.write_field(&obj, "instanceVar", Value::I32(1)).unwrap();
    assert_eq!(vm.read_field(&obj, "instanceVar").unwrap(), Value::I32(1));

    // A second instance shares statics but not instance state.
    let other = vm.invoke_constructor_by_name("MyObject", &[]).unwrap();
    assert_eq!(vm.read_field(&other, "staticVar").unwrap(), Value::I32(1));
    assert_eq!(vm.read_field(&other, "instanceVar").unwrap(), Value::I32(0));
}

#[test]
fn test_instanceof_and_cast() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("MyObject")).unwrap();

    let class = vm.class_id("MyObject").unwrap();
    let root = vm.class_id("Object").unwrap();
    let obj = vm.invoke_constructor(class, &[]).unwrap();

    assert!(vm.is_instance(&obj, class));
    assert!(vm.is_instance(&obj, root));

    // Upcast then downcast: representation unchanged, type tests survive.
    let as_root = vm.check_cast(&obj, root).unwrap();
    assert!(as_root.ref_eq(&obj).unwrap());
    let back = vm.check_cast(&as_root, class).unwrap();
    assert!(vm.is_instance(&back, class));
}

#[test]
fn test_static_initializer_accumulates_once() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    vm.register_class(
        ClassDef::new("Accumulator")
            .static_field("sum", TypeTag::I64)
            .static_init(|vm, _| {
                vm.invoke_static_by_name("Console", "print", &[Value::text("init;")])?;
                let class = vm.class_id("Accumulator")?;
                let mut sum = 0i64;
                for i in 1..=100 {
                    sum += i;
                }
                vm.write_static(class, "sum", Value::I64(sum))?;
                Ok(Value::null())
            }),
    )
    .unwrap();

    // Nothing runs until first use.
    assert_eq!(*out.lock(), "");

    let class = vm.class_id("Accumulator").unwrap();
    assert_eq!(vm.read_static(class, "sum").unwrap(), Value::I64(5050));

    // Repeated reads and any number of instantiations re-run nothing.
    for _ in 0..3 {
        vm.invoke_constructor(class, &[]).unwrap();
        assert_eq!(vm.read_static(class, "sum").unwrap(), Value::I64(5050));
    }
    assert_eq!(*out.lock(), "init;");
}

#[test]
fn test_instance_fields_default_to_zero_before_constructor_body() {
    let (mut vm, _) = capture_vm();
    vm.register_class(
        ClassDef::new("Probe")
            .instance_field("value", TypeTag::I64)
            .instance_field("observed", TypeTag::I64)
            .constructor(&[], |vm, frame| {
                let this = Value::object(frame.this()?);
                // Read before any assignment: must see the zero default.
                let seen = vm.read_field(&this, "value")?;
                vm.write_field(&this, "observed", seen)?;
                vm.write_field(&this, "value", Value::I64(41))?;
                Ok(Value::null())
            }),
    )
    .unwrap();

    let obj = vm.invoke_constructor_by_name("Probe", &[]).unwrap();
    assert_eq!(vm.read_field(&obj, "observed").unwrap(), Value::I64(0));
    assert_eq!(vm.read_field(&obj, "value").unwrap(), Value::I64(41));
}

#[test]
fn test_reference_identity_and_null() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("MyObject")).unwrap();

    let a = vm.invoke_constructor_by_name("MyObject", &[]).unwrap();
    let b = vm.invoke_constructor_by_name("MyObject", &[]).unwrap();

    assert!(a.ref_eq(&a).unwrap());
    assert!(!a.ref_eq(&b).unwrap());
    assert!(!a.ref_eq(&Value::null()).unwrap());

    // Null is a valid value of every reference field.
    let err = vm.read_field(&Value::null(), "anything").unwrap_err();
    assert!(matches!(err, RuntimeError::NullPointer));
}
