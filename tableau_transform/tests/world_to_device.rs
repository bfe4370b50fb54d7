// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for `Matrix4::world_to_device` and the translate/inverse laws.

use tableau_transform::{Matrix4, Point3, TransformError};

fn assert_maps(m: &Matrix4, world: Point3, device: (f64, f64)) {
    let p = m.transform_point(world);
    assert!(
        (p.x - device.0).abs() < 1e-9 && (p.y - device.1).abs() < 1e-9,
        "{world:?} mapped to ({}, {}), expected {device:?}",
        p.x,
        p.y
    );
}

#[test]
fn unit_frame_maps_onto_viewport_corners() {
    let w0 = Point3::new(0.0, 0.0, 0.0);
    let w1 = Point3::new(1.0, 0.0, 0.0);
    let w2 = Point3::new(0.0, 1.0, 0.0);
    let m = Matrix4::world_to_device(w0, w1, w2, 0.0, 0.0, 100.0, 50.0).unwrap();

    assert_maps(&m, w2, (0.0, 0.0));
    assert_maps(&m, w0, (0.0, 50.0));
    assert_maps(&m, w1, (100.0, 50.0));
    // The fourth corner is implied by affinity.
    assert_maps(&m, Point3::new(1.0, 1.0, 0.0), (100.0, 0.0));
}

#[test]
fn offset_viewport_and_skewed_frame() {
    let w0 = Point3::new(2.0, 3.0, 1.0);
    let w1 = Point3::new(7.0, 4.0, -1.0);
    let w2 = Point3::new(1.0, 8.0, 2.0);
    let m = Matrix4::world_to_device(w0, w1, w2, 10.0, 20.0, 300.0, 200.0).unwrap();

    assert_maps(&m, w2, (10.0, 20.0));
    assert_maps(&m, w0, (10.0, 220.0));
    assert_maps(&m, w1, (310.0, 220.0));

    // Points in the frame's plane stay at device z = 0.
    let mid = w1.midpoint(w2);
    assert!(m.transform_point(mid).z.abs() < 1e-9);
    assert_maps(&m, mid, (160.0, 120.0));
}

#[test]
fn device_to_world_through_inverse() {
    let w0 = Point3::new(-180.0, -90.0, 0.0);
    let w1 = Point3::new(180.0, -90.0, 0.0);
    let w2 = Point3::new(-180.0, 90.0, 0.0);
    let m = Matrix4::world_to_device(w0, w1, w2, 0.0, 0.0, 720.0, 360.0).unwrap();
    let inv = m.inverse().unwrap();

    let world = inv.transform_point(Point3::new(360.0, 180.0, 0.0));
    assert!(world.x.abs() < 1e-9 && world.y.abs() < 1e-9);
}

#[test]
fn collinear_extent_is_rejected() {
    let w0 = Point3::new(0.0, 0.0, 0.0);
    let w1 = Point3::new(1.0, 1.0, 0.0);
    let w2 = Point3::new(2.0, 2.0, 0.0);
    assert_eq!(
        Matrix4::world_to_device(w0, w1, w2, 0.0, 0.0, 100.0, 100.0),
        Err(TransformError::DegenerateExtent)
    );
    // Coincident points are the extreme collinear case.
    assert_eq!(
        Matrix4::world_to_device(w0, w0, w2, 0.0, 0.0, 100.0, 100.0),
        Err(TransformError::DegenerateExtent)
    );
}

#[test]
fn non_finite_extent_is_rejected() {
    let w0 = Point3::new(f64::NAN, 0.0, 0.0);
    let w1 = Point3::new(1.0, 0.0, 0.0);
    let w2 = Point3::new(0.0, 1.0, 0.0);
    assert_eq!(
        Matrix4::world_to_device(w0, w1, w2, 0.0, 0.0, 100.0, 100.0),
        Err(TransformError::DegenerateExtent)
    );
}

#[test]
fn translate_then_inverse_translate_is_identity() {
    let (dx, dy, dz) = (12.5, -3.25, 8.0);
    let m = Matrix4::translation(dx, dy, dz) * Matrix4::translation(-dx, -dy, -dz);
    assert!(m.is_identity_within(0.0));

    let inv = Matrix4::translation(dx, dy, dz).inverse().unwrap();
    assert!((inv * Matrix4::translation(dx, dy, dz)).is_identity_within(1e-12));
}

#[test]
fn composition_is_associative() {
    let a = Matrix4::rotation_z(0.4);
    let b = Matrix4::translation(1.0, 2.0, 3.0);
    let c = Matrix4::scaling(2.0, 3.0, 4.0);
    let left = (a * b) * c;
    let right = a * (b * c);
    for (x, y) in left.as_array().iter().zip(right.as_array().iter()) {
        assert!((x - y).abs() < 1e-12);
    }
}

#[test]
fn flat_arrays_match_single_point_transforms() {
    let m = Matrix4::translation(0.5, 0.5, 0.0) * Matrix4::scaling(10.0, 10.0, 1.0);
    let coords = [0.0, 0.0, 1.0, 2.0];
    let out = m.transform_points_2d(&coords).unwrap();
    assert_eq!(out, vec![0.5, 0.5, 10.5, 20.5]);
    assert_eq!(m.transform_points_2d_rounded(&coords).unwrap(), vec![1, 1, 11, 21]);

    let out3 = m.transform_points_3d(&[1.0, 1.0, 5.0]).unwrap();
    assert_eq!(out3, vec![10.5, 10.5, 5.0]);
    assert_eq!(m.transform_points_3d_rounded(&[1.0, 1.0, 5.0]).unwrap(), vec![11, 11, 5]);
}
