//! Error taxonomy coverage: every fault surfaces to the caller of the
//! entry point that triggered it, and committed state survives the unwind.

use sable_engine::{ClassDef, RuntimeError, TypeTag, Value, VmOptions};

use super::harness::*;

#[test]
fn test_duplicate_class_registration() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("A")).unwrap();

    let err = vm.register_class(ClassDef::new("A")).unwrap_err();
    assert!(matches!(err, RuntimeError::DuplicateClass(name) if name == "A"));
}

#[test]
fn test_no_such_field() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("A")).unwrap();
    let obj = vm.invoke_constructor_by_name("A", &[]).unwrap();

    let err = vm.read_field(&obj, "missing").unwrap_err();
    assert!(matches!(err, RuntimeError::NoSuchField { field, .. } if field == "missing"));
    let err = vm.write_field(&obj, "missing", Value::I32(1)).unwrap_err();
    assert!(matches!(err, RuntimeError::NoSuchField { .. }));
}

#[test]
fn test_no_such_method_and_unknown_class() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("A")).unwrap();
    let class = vm.class_id("A").unwrap();

    let err = vm.invoke_static(class, "absent", &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::NoSuchMethod { .. }));

    let err = vm.class_id("Nope").unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownClass(name) if name == "Nope"));
}

#[test]
fn test_invalid_cast_between_siblings() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("Left")).unwrap();
    vm.register_class(ClassDef::new("Right")).unwrap();

    let left = vm.invoke_constructor_by_name("Left", &[]).unwrap();
    let right_class = vm.class_id("Right").unwrap();

    let err = vm.check_cast(&left, right_class).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::InvalidCast { from, to } if from == "Left" && to == "Right"
    ));
    // The failed cast changed nothing about the value.
    assert!(vm.is_instance(&left, vm.class_id("Left").unwrap()));
}

#[test]
fn test_null_reference_policy() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("A")).unwrap();
    let class = vm.class_id("A").unwrap();
    let root = vm.class_id("Object").unwrap();

    // Null is not an instance of anything, the universal root included.
    assert!(!vm.is_instance(&Value::null(), class));
    assert!(!vm.is_instance(&Value::null(), root));

    // But null passes every reference cast unchanged.
    let cast = vm.check_cast(&Value::null(), class).unwrap();
    assert!(cast.is_null());
}

#[test]
fn test_stack_overflow_is_contained() {
    let (mut vm, _) = capture_vm_with(VmOptions { max_call_depth: 64 });
    vm.register_class(ClassDef::new("Loop").static_method("spin", &[], |vm, _| {
        vm.invoke_static_by_name("Loop", "spin", &[])
    }))
    .unwrap();

    let err = vm.invoke_static_by_name("Loop", "spin", &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::StackOverflow));

    // The fault unwound the whole invocation; the engine stays usable.
    assert_eq!(vm.call_depth(), 0);
    vm.register_class(ClassDef::new("After").static_method("ok", &[], |_, _| {
        Ok(Value::I32(1))
    }))
    .unwrap();
    assert_eq!(
        vm.invoke_static_by_name("After", "ok", &[]).unwrap(),
        Value::I32(1)
    );
}

#[test]
fn test_initializer_reentry_is_a_no_op() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    vm.register_class(
        ClassDef::new("SelfRef")
            .static_field("seen", TypeTag::I64)
            .static_init(|vm, _| {
                vm.invoke_static_by_name("Console", "print", &[Value::text("run;")])?;
                let class = vm.class_id("SelfRef")?;
                // Touching our own static state mid-initialization must not
                // re-enter the initializer.
                let current = vm.read_static(class, "seen")?;
                vm.write_static(class, "seen", current.add(&Value::I64(1))?)?;
                Ok(Value::null())
            }),
    )
    .unwrap();

    let class = vm.class_id("SelfRef").unwrap();
    assert_eq!(vm.read_static(class, "seen").unwrap(), Value::I64(1));
    assert_eq!(*out.lock(), "run;");
}

#[test]
fn test_failing_initializer_is_not_rerun() {
    let (mut vm, out) = capture_vm();
    register_console(&mut vm);

    vm.register_class(
        ClassDef::new("Broken")
            .static_field("partial", TypeTag::I64)
            .static_init(|vm, _| {
                vm.invoke_static_by_name("Console", "print", &[Value::text("attempt;")])?;
                let class = vm.class_id("Broken")?;
                vm.write_static(class, "partial", Value::I64(17))?;
                Err(RuntimeError::NullPointer)
            }),
    )
    .unwrap();

    let class = vm.class_id("Broken").unwrap();
    let err = vm.read_static(class, "partial").unwrap_err();
    assert!(matches!(err, RuntimeError::NullPointer));

    // Second use neither re-runs the initializer nor rolls back what it
    // committed before faulting.
    assert_eq!(vm.read_static(class, "partial").unwrap(), Value::I64(17));
    assert_eq!(*out.lock(), "attempt;");
}

#[test]
fn test_type_mismatch_on_field_write() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("Typed").instance_field("n", TypeTag::I32))
        .unwrap();
    let obj = vm.invoke_constructor_by_name("Typed", &[]).unwrap();

    // i64 never narrows into an i32 slot.
    let err = vm.write_field(&obj, "n", Value::I64(1)).unwrap_err();
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
}

#[test]
fn test_constructor_argument_mismatch() {
    let (mut vm, _) = capture_vm();
    vm.register_class(ClassDef::new("NoArgs")).unwrap();

    let err = vm
        .invoke_constructor_by_name("NoArgs", &[Value::I32(1)])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::NoSuchMethod { method, .. } if method == "constructor"));
}
