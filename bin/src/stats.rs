use bufmesh::host::{EntityId, HeadlessHost};

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SceneStats {
    pub(crate) entities: usize,
    pub(crate) components: usize,
    pub(crate) meshes: usize,
    pub(crate) buffers: usize,
    pub(crate) buffer_bytes: usize,
    pub(crate) frames: u64,
}

impl SceneStats {
    pub(crate) fn new(host: &HeadlessHost) -> Self {
        let mut stats = Self {
            entities: 0,
            components: 0,
            meshes: host.meshes().len(),
            buffers: host.buffers().len(),
            buffer_bytes: host.buffers().iter().map(|b| b.data.len()).sum(),
            frames: host.frame_count(),
        };
        let mut pending: Vec<EntityId> = host.roots().to_vec();
        while let Some(id) = pending.pop() {
            if let Some(entity) = host.entity(id) {
                stats.entities += 1;
                stats.components += entity.components.len();
                pending.extend(&entity.children);
            }
        }
        stats
    }

    pub(crate) fn print_tree(host: &HeadlessHost) {
        for &root in host.roots() {
            Self::print_entity(host, root, 0);
        }
    }

    fn print_entity(host: &HeadlessHost, id: EntityId, depth: usize) {
        let Some(entity) = host.entity(id) else { return };
        let kinds: Vec<&str> = entity.components.iter().map(|c| c.kind()).collect();
        println!("{}{} [{}]", "  ".repeat(depth), entity.name, kinds.join(", "));
        for &child in &entity.children {
            Self::print_entity(host, child, depth + 1);
        }
    }

    pub(crate) fn print_summary(&self) {
        println!("\n=== Scene Summary ===");
        println!("Entities: {}", self.entities);
        println!("Components: {}", self.components);
        println!("Meshes: {}", self.meshes);
        println!("Buffers: {} ({} bytes)", self.buffers, self.buffer_bytes);
        println!("Frames run: {}", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bufmesh::scene::buffer_mesh_scene;
    use bufmesh::Viewport;

    #[test]
    fn counts_buffer_mesh_scene() {
        let mut host = HeadlessHost::new(Viewport::default(), 0).unwrap();
        buffer_mesh_scene(&mut host, Viewport::default(), 1.0).unwrap();

        let stats = SceneStats::new(&host);
        assert_eq!(stats.entities, 4);
        assert_eq!(stats.components, 4);
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.buffers, 2);
        assert_eq!(stats.buffer_bytes, 24 * 24 + 36 * 2);
    }
}
