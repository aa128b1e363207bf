use crate::models::Vec3;

#[test]
fn test_arithmetic() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-1.0, 0.5, 2.0);

    assert_eq!(a + b, Vec3::new(0.0, 2.5, 5.0));
    assert_eq!(a - b, Vec3::new(2.0, 1.5, 1.0));
    assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
    assert_eq!(a / 2.0, Vec3::new(0.5, 1.0, 1.5));
    assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
}

#[test]
fn test_dot_and_length() {
    let a = Vec3::new(3.0, 4.0, 0.0);
    assert_eq!(a.dot(a), 25.0);
    assert_eq!(a.length_squared(), 25.0);
    assert_eq!(a.length(), 5.0);
}

#[test]
fn test_component_bounds() {
    let a = Vec3::new(1.0, -2.0, 3.0);
    let b = Vec3::new(0.0, 5.0, -1.0);

    assert_eq!(a.min(b), Vec3::new(0.0, -2.0, -1.0));
    assert_eq!(a.max(b), Vec3::new(1.0, 5.0, 3.0));
    assert_eq!(a.max_component(), 3.0);
}

#[test]
fn test_assign_ops() {
    let mut a = Vec3::splat(1.0);
    a += Vec3::new(1.0, 2.0, 3.0);
    assert_eq!(a, Vec3::new(2.0, 3.0, 4.0));
    a -= Vec3::splat(1.0);
    assert_eq!(a, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_finiteness() {
    assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
    assert!(!Vec3::new(f64::NAN, 0.0, 0.0).is_finite());
    assert!(!Vec3::new(0.0, f64::INFINITY, 0.0).is_finite());
}
