//! Merging one model into another.

use super::types::Model;

impl Model {
    /// Merges `donor` into this model.
    ///
    /// The donor's buffers, buffer views, accessors and meshes are appended
    /// after the existing entries, and every index the donor carries is
    /// re-based so nothing collides. Existing entries are never reordered,
    /// so indices held elsewhere into this model stay valid. The donor is
    /// consumed.
    pub fn merge(&mut self, mut donor: Model) {
        let buffer_base = self.buffers.len() as i64;
        let view_base = self.buffer_views.len() as i64;
        let accessor_base = self.accessors.len() as i64;

        for view in &mut donor.buffer_views {
            view.buffer += buffer_base;
        }
        for accessor in &mut donor.accessors {
            accessor.buffer_view += view_base;
        }
        for mesh in &mut donor.meshes {
            for primitive in &mut mesh.primitives {
                for accessor_index in primitive.attributes.values_mut() {
                    *accessor_index += accessor_base;
                }
                if let Some(indices) = &mut primitive.indices {
                    *indices += accessor_base;
                }
                if let Some(compressed) = &mut primitive.compressed {
                    compressed.buffer_view += view_base;
                }
            }
        }

        self.buffers.append(&mut donor.buffers);
        self.buffer_views.append(&mut donor.buffer_views);
        self.accessors.append(&mut donor.accessors);
        self.meshes.append(&mut donor.meshes);
    }
}
