//! Binding cache integration tests.
//!
//! These drive [`VertexArrayState`] through a [`RecordingDevice`] and
//! assert on the exact calls issued.

mod common;

use std::sync::Arc;

use redlilium_vertex_state::{
    AttribPointer, AttributeAliasing, BufferHandle, BufferTarget, DataType, DeviceBuffer,
    DeviceCall, DeviceFeatures, FixedAttribute, RawArray, RecordingDevice, SharedArray,
    VertexArrayState, VertexArrayStateList, VertexStateConfig,
};
use rstest::rstest;

use common::{CountingSource, assigned_state, calls_for_slot, shared, vec3_source};

// ============================================================================
// Cache behaviour
// ============================================================================

#[test]
fn test_float3_slot2_scenario() {
    common::init_logging();
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let a = vec3_source(3);
    let source = shared(&a);

    // First bind: enable then point.
    state.set_array(&mut device, 2, Some(&source)).unwrap();
    let calls = device.take_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], DeviceCall::EnableVertexAttribArray(2));
    assert!(matches!(
        calls[1],
        DeviceCall::VertexAttribPointer {
            index: 2,
            size: 3,
            data_type: DataType::Float,
            ..
        }
    ));

    // Same source, unchanged.
    state.set_array(&mut device, 2, Some(&source)).unwrap();
    assert_eq!(device.call_count(), 0);

    // Modified: point again without enabling.
    a.dirty();
    state.set_array(&mut device, 2, Some(&source)).unwrap();
    let calls = device.take_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_pointer_call());

    // Null: one disable.
    state.set_array(&mut device, 2, None).unwrap();
    assert_eq!(device.take_calls(), vec![DeviceCall::DisableVertexAttribArray(2)]);
}

#[rstest]
#[case::vertex(FixedAttribute::Vertex)]
#[case::normal(FixedAttribute::Normal)]
#[case::color(FixedAttribute::Color)]
#[case::secondary_color(FixedAttribute::SecondaryColor)]
#[case::fog_coord(FixedAttribute::FogCoord)]
fn test_repeated_bind_is_idempotent(#[case] attribute: FixedAttribute) {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let source = shared(&vec3_source(4));

    for _ in 0..5 {
        state
            .set_fixed_array(&mut device, attribute, Some(&source))
            .unwrap();
    }

    assert_eq!(device.enable_count(), 1);
    assert_eq!(device.pointer_count(), 1);
    assert_eq!(device.call_count(), 2);
}

#[rstest]
#[case::one_bump(1)]
#[case::many_bumps(7)]
fn test_counter_change_repoints_once(#[case] bumps: usize) {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let counting = Arc::new(CountingSource::new(vec![0.0; 8]));
    let source: SharedArray = counting.clone();

    state.set_array(&mut device, 1, Some(&source)).unwrap();
    device.clear();

    for _ in 0..bumps {
        counting.bump();
    }
    state.set_array(&mut device, 1, Some(&source)).unwrap();
    state.set_array(&mut device, 1, Some(&source)).unwrap();

    assert_eq!(device.enable_count(), 0);
    assert_eq!(device.pointer_count(), 1);
}

#[test]
fn test_disable_on_null_then_rebind_enables() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let source = shared(&vec3_source(2));

    state.set_normal_array(&mut device, Some(&source)).unwrap();
    state.set_normal_array(&mut device, None).unwrap();
    state.set_normal_array(&mut device, None).unwrap();
    assert_eq!(device.disable_count(), 1);
    assert!(!state.dispatch(2).unwrap().is_bound());

    device.clear();
    state.set_normal_array(&mut device, Some(&source)).unwrap();
    assert_eq!(device.enable_count(), 1);
    assert_eq!(device.pointer_count(), 1);
}

#[rstest]
#[case::none(&[])]
#[case::single(&[5])]
#[case::several(&[0, 3, 9, 14])]
fn test_reset_disables_exactly_active_slots(#[case] slots: &[u32]) {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let source = shared(&vec3_source(2));

    for &slot in slots {
        state.set_array(&mut device, slot, Some(&source)).unwrap();
        // A repeated bind must not add a second active entry.
        state.set_array(&mut device, slot, Some(&source)).unwrap();
    }
    device.clear();

    state.reset(&mut device);

    let mut disabled = device.disabled_slots();
    disabled.sort_unstable();
    assert_eq!(disabled, slots);
    assert!(state.active_slots().is_empty());

    device.clear();
    state.reset(&mut device);
    assert_eq!(device.call_count(), 0);
}

#[test]
fn test_source_switch_between_types_changes_pointer_call() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let floats: SharedArray = Arc::new(redlilium_vertex_state::AttributeArray::floats(vec![1.0]));
    let ints: SharedArray = Arc::new(
        redlilium_vertex_state::AttributeArray::new(
            redlilium_vertex_state::ArrayType::Int,
            redlilium_vertex_state::ArrayStorage::I32(vec![7]),
        )
        .unwrap()
        .with_preserve_data_type(true),
    );

    state.set_vertex_attrib_array(&mut device, 6, Some(&floats)).unwrap();
    state.set_vertex_attrib_array(&mut device, 6, Some(&ints)).unwrap();
    state.set_vertex_attrib_array(&mut device, 6, Some(&floats)).unwrap();

    let calls = calls_for_slot(&device, 6);
    assert!(matches!(calls[1], DeviceCall::VertexAttribPointer { .. }));
    assert!(matches!(calls[2], DeviceCall::VertexAttribIPointer { .. }));
    assert!(matches!(calls[3], DeviceCall::VertexAttribPointer { .. }));
}

#[test]
fn test_dropped_source_replaced_by_new_one() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);

    let first = shared(&vec3_source(1));
    state.set_array(&mut device, 0, Some(&first)).unwrap();
    drop(first);

    let second = shared(&vec3_source(1));
    device.clear();
    state.set_array(&mut device, 0, Some(&second)).unwrap();

    assert_eq!(device.pointer_count(), 1);
    assert_eq!(device.enable_count(), 0);
}

// ============================================================================
// Raw pointers
// ============================================================================

#[test]
fn test_raw_pointer_is_never_cached() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let bytes = [0u8; 48];
    let raw = RawArray::new(4, DataType::Float, AttribPointer::Client(&bytes)).with_stride(16);

    for _ in 0..3 {
        state.set_raw_array(&mut device, 11, &raw).unwrap();
    }
    assert_eq!(device.enable_count(), 3);
    assert_eq!(device.pointer_count(), 3);

    device.clear();
    state.reset(&mut device);
    assert_eq!(device.disabled_slots(), vec![11]);
}

// ============================================================================
// Buffer objects
// ============================================================================

#[test]
fn test_buffer_backed_sources_share_binding() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let buffer = BufferHandle::new(3);
    let positions: SharedArray =
        Arc::new(CountingSource::new(vec![0.0; 8]).with_buffer(DeviceBuffer::new(buffer, 0)));
    let uvs: SharedArray =
        Arc::new(CountingSource::new(vec![0.0; 8]).with_buffer(DeviceBuffer::new(buffer, 32)));

    state.set_vertex_array(&mut device, Some(&positions)).unwrap();
    state.set_tex_coord_array(&mut device, 0, Some(&uvs)).unwrap();

    assert_eq!(device.bind_buffer_count(), 1);
    let uv_calls = calls_for_slot(&device, 8);
    assert!(matches!(
        uv_calls[1],
        DeviceCall::VertexAttribPointer {
            pointer: redlilium_vertex_state::device::RecordedPointer::Offset(32),
            ..
        }
    ));
}

#[test]
fn test_mixed_buffer_and_client_sources_rebind() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let in_buffer: SharedArray = Arc::new(
        CountingSource::new(vec![0.0; 4]).with_buffer(DeviceBuffer::new(BufferHandle::new(9), 0)),
    );
    let client = shared(&vec3_source(2));

    state.set_vertex_array(&mut device, Some(&in_buffer)).unwrap();
    state.set_normal_array(&mut device, Some(&client)).unwrap();
    state.set_color_array(&mut device, Some(&in_buffer)).unwrap();

    let binds: Vec<_> = device
        .calls()
        .iter()
        .filter_map(|call| match call {
            DeviceCall::BindBuffer {
                target: BufferTarget::Array,
                buffer,
            } => Some(*buffer),
            _ => None,
        })
        .collect();
    assert_eq!(
        binds,
        vec![Some(BufferHandle::new(9)), None, Some(BufferHandle::new(9))]
    );
}

// ============================================================================
// Vertex array objects
// ============================================================================

#[rstest]
#[case::unsupported(RecordingDevice::new(0).with_features(DeviceFeatures::all() - DeviceFeatures::VERTEX_ARRAY_OBJECTS))]
#[case::failing(RecordingDevice::new(0).with_failing_vertex_arrays())]
fn test_binding_works_without_vertex_array_object(#[case] mut device: RecordingDevice) {
    let mut state = assigned_state(0);
    assert!(state.generate_vertex_array_object(&mut device).is_err());
    assert!(state.vertex_array_object().is_none());

    let source = shared(&vec3_source(3));
    state.bind_vertex_array_object(&mut device);
    state.set_vertex_array(&mut device, Some(&source)).unwrap();
    state.set_vertex_array(&mut device, Some(&source)).unwrap();
    state.reset(&mut device);
    state.unbind_vertex_array_object(&mut device);

    assert_eq!(device.enable_count(), 1);
    assert_eq!(device.pointer_count(), 1);
    assert_eq!(device.disable_count(), 1);
}

// ============================================================================
// Aliasing
// ============================================================================

#[test]
fn test_contexts_keep_independent_aliasing() {
    let config = VertexStateConfig::new();
    let mut list = VertexArrayStateList::with_config(&config);
    let mut device0 = RecordingDevice::new(0);
    let mut device1 = RecordingDevice::new(1);
    list.get_or_create(&mut device0, &config).unwrap();
    list.get_or_create(&mut device1, &config).unwrap();

    let aliasing = AttributeAliasing::new();
    list.assign_all_dispatchers(&aliasing).unwrap();

    let remapped = AttributeAliasing::new()
        .with_slot(FixedAttribute::Normal, 7)
        .with_slot(FixedAttribute::Color, 6);
    list.get_mut(0)
        .unwrap()
        .reassign_all_dispatchers(&remapped)
        .unwrap();

    let state0 = list.get(0).unwrap();
    let state1 = list.get(1).unwrap();
    assert_eq!(state0.fixed_slot(FixedAttribute::Normal), Some(7));
    assert_eq!(state0.fixed_slot(FixedAttribute::Color), Some(6));
    assert_eq!(state1.fixed_slot(FixedAttribute::Normal), Some(2));
    assert_eq!(state1.fixed_slot(FixedAttribute::Color), Some(3));

    let source = shared(&vec3_source(1));
    list.get_mut(1)
        .unwrap()
        .set_normal_array(&mut device1, Some(&source))
        .unwrap();
    assert_eq!(calls_for_slot(&device1, 2).len(), 2);
    assert!(calls_for_slot(&device1, 7).is_empty());
}

#[test]
fn test_reassigned_attribute_binds_new_slot() {
    let mut state = assigned_state(0);
    let mut device = RecordingDevice::new(0);
    let source = shared(&vec3_source(1));
    state.set_color_array(&mut device, Some(&source)).unwrap();

    let aliasing = AttributeAliasing::new().with_slot(FixedAttribute::Color, 12);
    state
        .reassign_fixed_dispatcher(FixedAttribute::Color, &aliasing)
        .unwrap();
    assert!(state.requires_set_arrays());

    device.clear();
    state.set_color_array(&mut device, Some(&source)).unwrap();
    assert_eq!(device.calls()[0], DeviceCall::EnableVertexAttribArray(12));

    device.clear();
    state.reset(&mut device);
    let mut disabled = device.disabled_slots();
    disabled.sort_unstable();
    assert_eq!(disabled, vec![3, 12]);
}

#[test]
fn test_fan_out_reaches_every_context() {
    let mut list = VertexArrayStateList::new(3);
    for context in 0..3 {
        list.insert(context, VertexArrayState::new(context)).unwrap();
    }

    list.assign_vertex_array_dispatcher(&AttributeAliasing::new())
        .unwrap();
    list.assign_vertex_attrib_array_dispatcher(4).unwrap();

    for state in list.iter() {
        assert_eq!(state.fixed_slot(FixedAttribute::Vertex), Some(0));
        assert!(state.is_constructed(3));
        assert!(!state.is_constructed(4));
    }
}
