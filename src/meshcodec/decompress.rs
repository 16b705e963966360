//! The decompression operation: codec output back into model buffers.

use super::decoder::{DecodedMesh, MeshDecoder};
use crate::model::{Buffer, BufferView, ComponentType, ElementType, Model};
use tracing::warn;

/// Decompresses every primitive in the model that carries a compressed
/// payload.
///
/// Rebuilt index and attribute data is appended as new buffers; nothing
/// already in the model moves. Each failure skips the affected primitive
/// or attribute with a warning, and the compressed extension is removed
/// from every visited primitive either way. Returns the accumulated
/// warnings.
pub fn decompress_model(model: &mut Model, decoder: &dyn MeshDecoder) -> Vec<String> {
    let mut warnings = Vec::new();
    for mesh_index in 0..model.meshes.len() {
        for primitive_index in 0..model.meshes[mesh_index].primitives.len() {
            let Some(extension) = model.meshes[mesh_index].primitives[primitive_index]
                .compressed
                .clone()
            else {
                continue;
            };
            decompress_primitive(
                model,
                decoder,
                mesh_index,
                primitive_index,
                &extension,
                &mut warnings,
            );
            model.meshes[mesh_index].primitives[primitive_index].compressed = None;
        }
    }
    warnings
}

fn decompress_primitive(
    model: &mut Model,
    decoder: &dyn MeshDecoder,
    mesh_index: usize,
    primitive_index: usize,
    extension: &crate::model::CompressedMeshExtension,
    warnings: &mut Vec<String>,
) {
    let Some(payload) = compressed_payload(model, extension.buffer_view) else {
        warn!(
            mesh = mesh_index,
            primitive = primitive_index,
            buffer_view = extension.buffer_view,
            "compressed payload buffer view is invalid"
        );
        warnings.push(format!(
            "Compressed primitive references invalid buffer view {}.",
            extension.buffer_view
        ));
        return;
    };

    let decoded = match decoder.decode(&payload) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(mesh = mesh_index, primitive = primitive_index, error = %err, "mesh decompression failed");
            warnings.push(format!("Failed to decompress primitive: {err}."));
            return;
        }
    };

    if let Some(indices) = model.meshes[mesh_index].primitives[primitive_index].indices {
        rebuild_indices(model, &decoded, indices, warnings);
    }

    for (name, codec_id) in &extension.attributes {
        rebuild_attribute(
            model,
            &decoded,
            mesh_index,
            primitive_index,
            name,
            *codec_id,
            warnings,
        );
    }
}

/// Copies the compressed bytes out of the model, bounds-checked.
fn compressed_payload(model: &Model, view_index: i64) -> Option<Vec<u8>> {
    let view = model.buffer_view_at(view_index)?;
    let buffer = model.buffer_at(view.buffer)?;
    let offset = usize::try_from(view.byte_offset).ok()?;
    let length = usize::try_from(view.byte_length).ok()?;
    let end = offset.checked_add(length)?;
    buffer.data.get(offset..end).map(<[u8]>::to_vec)
}

/// Appends `data` as a new buffer with a view spanning it, returning the
/// view index.
fn append_view(model: &mut Model, data: Vec<u8>) -> i64 {
    let byte_length = data.len() as i64;
    model.buffers.push(Buffer { data });
    model.buffer_views.push(BufferView {
        buffer: model.buffers.len() as i64 - 1,
        byte_offset: 0,
        byte_length,
        byte_stride: None,
    });
    model.buffer_views.len() as i64 - 1
}

fn rebuild_indices(
    model: &mut Model,
    decoded: &DecodedMesh,
    accessor_index: i64,
    warnings: &mut Vec<String>,
) {
    let Some(accessor) = model.accessor_at(accessor_index) else {
        warn!(accessor = accessor_index, "index accessor is invalid");
        warnings.push(format!("Invalid index accessor {accessor_index}."));
        return;
    };
    let declared_code = accessor.component_type;
    let declared_count = accessor.count;

    let index_count = (decoded.faces.len() * 3) as i64;
    if declared_count != index_count {
        warn!(
            declared = declared_count,
            decoded = index_count,
            "index count disagrees with the decompressed faces, using the decompressed count"
        );
        warnings.push(format!(
            "Declared index count {declared_count} disagrees with the decompressed count {index_count}."
        ));
    }

    // Narrowest unsigned type that can hold every point index, then widen
    // to the declared type if that one is wider. Never narrow.
    let needed = if decoded.point_count < u32::from(u8::MAX) {
        ComponentType::UnsignedByte
    } else if decoded.point_count < u32::from(u16::MAX) {
        ComponentType::UnsignedShort
    } else {
        ComponentType::UnsignedInt
    };
    let index_type = match ComponentType::from_code(declared_code) {
        Some(declared) if declared.code() > needed.code() => declared,
        _ => needed,
    };

    let mut bytes = Vec::with_capacity(index_count as usize * index_type.byte_size());
    for face in &decoded.faces {
        for &index in face {
            write_component(&mut bytes, index_type, f64::from(index));
        }
    }
    let view = append_view(model, bytes);

    let Some(accessor) = model.accessor_at_mut(accessor_index) else {
        return;
    };
    accessor.buffer_view = view;
    accessor.byte_offset = 0;
    accessor.component_type = index_type.code();
    accessor.count = index_count;
    accessor.element_type = ElementType::Scalar;
}

fn rebuild_attribute(
    model: &mut Model,
    decoded: &DecodedMesh,
    mesh_index: usize,
    primitive_index: usize,
    name: &str,
    codec_id: i64,
    warnings: &mut Vec<String>,
) {
    let Some(accessor_index) = model.meshes[mesh_index].primitives[primitive_index]
        .attributes
        .get(name)
        .copied()
    else {
        warn!(attribute = name, "primitive does not declare the compressed attribute");
        warnings.push(format!(
            "Primitive does not declare compressed attribute {name:?}."
        ));
        return;
    };
    let Some(accessor) = model.accessor_at(accessor_index) else {
        warn!(attribute = name, accessor = accessor_index, "attribute accessor is invalid");
        warnings.push(format!(
            "Attribute {name:?} references invalid accessor {accessor_index}."
        ));
        return;
    };
    let element_type = accessor.element_type;
    let declared_count = accessor.count;
    let declared_code = accessor.component_type;

    let Some(component_type) = ComponentType::from_code(declared_code) else {
        warn!(
            attribute = name,
            code = declared_code,
            "attribute accessor has an unrecognized component type"
        );
        warnings.push(format!(
            "Attribute {name:?} has unrecognized component type {declared_code}."
        ));
        return;
    };

    let Some(attribute) = decoded.attribute(codec_id) else {
        warn!(attribute = name, codec_id, "codec did not produce the attribute");
        warnings.push(format!(
            "Codec did not produce attribute {name:?} (id {codec_id})."
        ));
        return;
    };

    let available = attribute.point_count() as i64;
    let count = if declared_count > available {
        warn!(
            attribute = name,
            declared = declared_count,
            available,
            "fewer points decompressed than the accessor declares"
        );
        warnings.push(format!(
            "Attribute {name:?} declares {declared_count} points but only {available} were decompressed."
        ));
        available
    } else {
        declared_count
    };

    // Components beyond what the codec produced are written as zero.
    let components = element_type.component_count();
    let mut bytes = Vec::with_capacity(count as usize * components * component_type.byte_size());
    for point in 0..count as usize {
        for component in 0..components {
            let value = if component < attribute.components {
                attribute.values[point * attribute.components + component]
            } else {
                0.0
            };
            write_component(&mut bytes, component_type, value);
        }
    }
    let view = append_view(model, bytes);

    let Some(accessor) = model.accessor_at_mut(accessor_index) else {
        return;
    };
    accessor.buffer_view = view;
    accessor.byte_offset = 0;
    accessor.count = count;
}

/// Writes one component in the given type, little-endian.
fn write_component(bytes: &mut Vec<u8>, component_type: ComponentType, value: f64) {
    match component_type {
        ComponentType::Byte => bytes.push(value as i8 as u8),
        ComponentType::UnsignedByte => bytes.push(value as u8),
        ComponentType::Short => bytes.extend_from_slice(&(value as i16).to_le_bytes()),
        ComponentType::UnsignedShort => bytes.extend_from_slice(&(value as u16).to_le_bytes()),
        ComponentType::UnsignedInt => bytes.extend_from_slice(&(value as u32).to_le_bytes()),
        ComponentType::Float => bytes.extend_from_slice(&(value as f32).to_le_bytes()),
    }
}
