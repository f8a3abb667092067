//! The versioned binary format for a registry plus a behavior tree.
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! registry block:
//!   u32 flag                     bits [31:24] version, [15:0] entry count
//!   string board_name            (version >= 1)
//!   entries: i32 handle, u32 type, string name
//! context block:
//!   u32 node_count
//!   u8 version_major             currently 1
//!   u8 version_minor             currently 2
//!   "BTED"                       (minor >= 2, rejected when absent)
//!   i32 lod                      (minor >= 1)
//!   node list: string kind, uuid16 (major >= 1)
//!   root body, then one body per listed node
//! node body:
//!   string name
//!   u64 decorator count, decorator kinds, decorator bodies (u8 flags
//!   trailer each), Vec2 canvas_uv, then the kind-specific fields
//! ```
//!
//! Loading is atomic: the decoded registry and context are only handed to
//! the caller once the whole stream parsed.

use std::collections::HashMap;
use std::path::Path;

use salix_core::wire::{Decoder, Encoder, WireError};
use salix_core::{
    AttachedDecorator, Context, DataEntry, DataHandle, DataType, Node, NodeIndex, NodeKind,
    Registry, RegistryError, TreeError,
};

use crate::kinds::KindRegistry;

pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 2;
pub const MAGIC: [u8; 4] = *b"BTED";

const REGISTRY_VERSION: u8 = 1;

const DECO_FLAG_ABORT_SELF: u8 = 1 << 0;
const DECO_FLAG_ABORT_LOWER: u8 = 1 << 1;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("bad magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("unexpected end of stream")]
    TruncatedStream,
    #[error("unknown node kind {0:?}")]
    UnknownNodeKind(String),
    #[error("unknown decorator kind {0:?}")]
    UnknownDecoratorKind(String),
    #[error("node index {0} out of range")]
    BadIndex(i32),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WireError> for LoadError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::TruncatedStream => LoadError::TruncatedStream,
            WireError::Io(io) => LoadError::Io(io),
        }
    }
}

// ----------------------------------------------------------------------
// Registry block.

pub fn write_registry(registry: &Registry, w: &mut Encoder) {
    let flag = ((REGISTRY_VERSION as u32) << 24) | (registry.len() as u32 & 0xFFFF);
    w.write_u32(flag);
    w.write_str(registry.board_name());
    for entry in registry.entries() {
        w.write_i32(entry.handle.0 as i32);
        w.write_u32(entry.data_type as u32);
        w.write_str(&entry.name);
    }
}

pub fn read_registry(r: &mut Decoder<'_>) -> Result<Registry, LoadError> {
    let flag = r.read_u32()?;
    let version = (flag >> 24) as u8;
    let count = (flag & 0xFFFF) as usize;
    let board_name = if version >= 1 {
        r.read_str()?
    } else {
        "Board".to_owned()
    };
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let handle = DataHandle(r.read_i32()? as u16);
        let data_type = DataType::from_u32(r.read_u32()?);
        let name = r.read_str()?;
        entries.push(DataEntry {
            handle,
            name,
            data_type,
        });
    }
    Ok(Registry::from_entries(board_name, entries))
}

// ----------------------------------------------------------------------
// Context block.

pub fn write_context(ctx: &Context, w: &mut Encoder) {
    // Live nodes, root excluded, compacted to dense file indices.
    let listed: Vec<NodeIndex> = ctx
        .nodes()
        .into_iter()
        .filter(|&index| index != Context::ROOT)
        .collect();
    let file_index: HashMap<NodeIndex, i32> = listed
        .iter()
        .enumerate()
        .map(|(file, &index)| (index, file as i32))
        .collect();

    w.write_u32(listed.len() as u32);
    w.write_u8(VERSION_MAJOR);
    w.write_u8(VERSION_MINOR);
    w.write_raw(&MAGIC);
    w.write_i32(ctx.lod);

    for &index in &listed {
        let node = ctx.node(index).expect("listed node is live").borrow();
        w.write_str(node.kind.registry_name());
        w.write_uuid(&node.uuid);
    }
    write_node_body(ctx, Context::ROOT, &file_index, w);
    for &index in &listed {
        write_node_body(ctx, index, &file_index, w);
    }
}

fn write_node_body(
    ctx: &Context,
    index: NodeIndex,
    file_index: &HashMap<NodeIndex, i32>,
    w: &mut Encoder,
) {
    let node = ctx.node(index).expect("listed node is live").borrow();
    w.write_str(&node.name);
    w.write_u64(node.decorators.len() as u64);
    for attached in &node.decorators {
        w.write_str(attached.decorator.kind());
    }
    for attached in &node.decorators {
        attached.decorator.save_body(w);
        let mut flags = 0u8;
        if attached.abort_self {
            flags |= DECO_FLAG_ABORT_SELF;
        }
        if attached.abort_lower {
            flags |= DECO_FLAG_ABORT_LOWER;
        }
        w.write_u8(flags);
    }
    w.write_vec2(node.canvas_uv);

    match &node.kind {
        NodeKind::Root => {
            let entry = node
                .children()
                .first()
                .map(|child| file_index[child])
                .unwrap_or(-1);
            w.write_i32(entry);
        }
        NodeKind::Sequence { scoped } | NodeKind::Selector { scoped } => {
            w.write_bool(*scoped);
            w.write_u64(node.children().len() as u64);
            for child in node.children() {
                w.write_i32(file_index[child]);
            }
        }
        NodeKind::Task(task) => task.save_body(w),
    }
}

/// Deferred child links, applied once every body has been decoded so the
/// canvas-based child ordering sees final positions.
enum BodyLinks {
    Entry(i32),
    Children(Vec<i32>),
    None,
}

pub fn read_context(r: &mut Decoder<'_>, kinds: &KindRegistry) -> Result<Context, LoadError> {
    let node_count = r.read_u32()? as usize;
    let major = r.read_u8()?;
    let minor = r.read_u8()?;
    if major > VERSION_MAJOR || (major == VERSION_MAJOR && minor > VERSION_MINOR) {
        return Err(LoadError::UnsupportedVersion { major, minor });
    }
    if minor >= 2 {
        let mut found = [0u8; 4];
        found.copy_from_slice(r.read_raw(4)?);
        if found != MAGIC {
            return Err(LoadError::BadMagic { found });
        }
    }
    let lod = if minor >= 1 { r.read_i32()? } else { 0 };
    tracing::debug!(node_count, major, minor, "decoding behavior tree");

    let mut ctx = Context::new();
    ctx.lod = lod;

    let mut created = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let kind_name = r.read_str()?;
        let kind = match kind_name.as_str() {
            "CompSequence" => NodeKind::Sequence { scoped: false },
            "CompSelect" => NodeKind::Selector { scoped: false },
            other => NodeKind::Task(kinds.create_task(other)?),
        };
        let mut node = Node::new(kind, "");
        if major >= 1 {
            node.uuid = r.read_uuid()?;
        }
        created.push(ctx.add_node(node));
    }

    let mut links = Vec::with_capacity(node_count + 1);
    links.push((Context::ROOT, read_node_body(r, kinds, &mut ctx, Context::ROOT)?));
    for &index in &created {
        links.push((index, read_node_body(r, kinds, &mut ctx, index)?));
    }

    for (index, link) in links {
        match link {
            BodyLinks::None => {}
            BodyLinks::Entry(entry) => {
                let entry = match entry {
                    -1 => None,
                    file => Some(map_index(&created, file)?),
                };
                ctx.set_entry(entry)?;
            }
            BodyLinks::Children(children) => {
                let children = children
                    .into_iter()
                    .map(|file| map_index(&created, file))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.set_children(index, &children)?;
            }
        }
    }
    ctx.refresh_order();
    Ok(ctx)
}

fn map_index(created: &[NodeIndex], file: i32) -> Result<NodeIndex, LoadError> {
    usize::try_from(file)
        .ok()
        .and_then(|i| created.get(i).copied())
        .ok_or(LoadError::BadIndex(file))
}

fn read_node_body(
    r: &mut Decoder<'_>,
    kinds: &KindRegistry,
    ctx: &mut Context,
    index: NodeIndex,
) -> Result<BodyLinks, LoadError> {
    let name = r.read_str()?;
    let decorator_count = r.read_u64()? as usize;
    let mut decorator_kinds = Vec::with_capacity(decorator_count);
    for _ in 0..decorator_count {
        decorator_kinds.push(r.read_str()?);
    }
    let mut decorators = Vec::with_capacity(decorator_count);
    for kind_name in &decorator_kinds {
        let mut decorator = kinds.create_decorator(kind_name)?;
        decorator.load_body(r)?;
        let flags = r.read_u8()?;
        let mut attached = AttachedDecorator::new(decorator);
        attached.abort_self = flags & DECO_FLAG_ABORT_SELF != 0;
        attached.abort_lower = flags & DECO_FLAG_ABORT_LOWER != 0;
        decorators.push(attached);
    }
    let canvas_uv = r.read_vec2()?;

    let cell = ctx.node(index).expect("decoded node is live");
    {
        let mut node = cell.borrow_mut();
        node.name = name;
        node.decorators = decorators;
        node.canvas_uv = canvas_uv;
    }

    let mut node = cell.borrow_mut();
    match &mut node.kind {
        NodeKind::Root => Ok(BodyLinks::Entry(r.read_i32()?)),
        NodeKind::Sequence { scoped } | NodeKind::Selector { scoped } => {
            *scoped = r.read_bool()?;
            let child_count = r.read_u64()? as usize;
            let mut children = Vec::with_capacity(child_count);
            for _ in 0..child_count {
                children.push(r.read_i32()?);
            }
            Ok(BodyLinks::Children(children))
        }
        NodeKind::Task(task) => {
            task.load_body(r)?;
            Ok(BodyLinks::None)
        }
    }
}

// ----------------------------------------------------------------------
// Whole-board convenience.

/// Serialize a registry plus context into one transportable blob.
pub fn save_board(registry: &Registry, ctx: &Context) -> Vec<u8> {
    let mut w = Encoder::new();
    write_registry(registry, &mut w);
    write_context(ctx, &mut w);
    w.into_bytes()
}

/// Inverse of [`save_board`]. Nothing is installed on failure.
pub fn load_board(bytes: &[u8], kinds: &KindRegistry) -> Result<(Registry, Context), LoadError> {
    let mut r = Decoder::new(bytes);
    let registry = read_registry(&mut r)?;
    let ctx = read_context(&mut r, kinds)?;
    Ok((registry, ctx))
}

pub fn save_file(
    path: impl AsRef<Path>,
    registry: &Registry,
    ctx: &Context,
) -> Result<(), std::io::Error> {
    std::fs::write(path, save_board(registry, ctx))
}

pub fn load_file(
    path: impl AsRef<Path>,
    kinds: &KindRegistry,
) -> Result<(Registry, Context), LoadError> {
    let bytes = std::fs::read(path)?;
    load_board(&bytes, kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::KindRegistry;
    use salix_core::nodes::{DummyDecorator, DummyTask};
    use salix_core::{ExecResult, Vec2};
    use salix_std::nodes::{
        AttackTask, CanSeeDecorator, CooldownDecorator, FireEventTask, IsInRangeDecorator,
        KeepDistanceTask, MakeNoiseTask, MoveToTask, PlaySoundTask, RandomPointTask, SetValueTask,
        WaitTask, WatchValueDecorator,
    };

    fn full_kinds() -> KindRegistry {
        let mut kinds = KindRegistry::new();
        kinds.add_task::<DummyTask>();
        kinds.add_task::<WaitTask>();
        kinds.add_task::<PlaySoundTask>();
        kinds.add_task::<FireEventTask>();
        kinds.add_task::<MoveToTask>();
        kinds.add_task::<AttackTask>();
        kinds.add_task::<RandomPointTask>();
        kinds.add_task::<KeepDistanceTask>();
        kinds.add_task::<SetValueTask>();
        kinds.add_task::<MakeNoiseTask>();
        kinds.add_decorator::<DummyDecorator>();
        kinds.add_decorator::<CooldownDecorator>();
        kinds.add_decorator::<WatchValueDecorator>();
        kinds.add_decorator::<CanSeeDecorator>();
        kinds.add_decorator::<IsInRangeDecorator>();
        kinds.add_decorator_alias::<CooldownDecorator>("DecoratorCooldown");
        kinds
    }

    /// Root (+WatchValue abort_lower) -> Sequence -> Wait(10).
    fn alert_board() -> (Registry, Context) {
        let mut registry = Registry::new();
        registry.register("Alert", DataType::Boolean).unwrap();
        let mut ctx = Context::new();
        let mut gate = AttachedDecorator::new(Box::new(WatchValueDecorator::when_set("Alert")));
        gate.abort_lower = true;
        ctx.add_decorator(Context::ROOT, gate).unwrap();
        let seq = ctx.add_node(Node::new(NodeKind::Sequence { scoped: true }, "patrol"));
        ctx.add_child(Context::ROOT, seq).unwrap();
        let wait = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(WaitTask::new(10.0))),
            "hold",
        ));
        ctx.add_child(seq, wait).unwrap();
        ctx.lod = 2;
        (registry, ctx)
    }

    #[test]
    fn save_load_is_byte_idempotent() {
        let (registry, ctx) = alert_board();
        let bytes = save_board(&registry, &ctx);
        let (registry2, ctx2) = load_board(&bytes, &full_kinds()).unwrap();
        let bytes2 = save_board(&registry2, &ctx2);
        assert_eq!(bytes, bytes2);

        assert_eq!(registry2.board_name(), "Board");
        assert_eq!(registry2.handle_of("Alert"), registry.handle_of("Alert"));
        assert_eq!(ctx2.lod, 2);

        // Node identities and structure survive.
        for index in ctx.nodes() {
            let original = ctx.node(index).unwrap().borrow();
            let reloaded = ctx2.node(index).unwrap().borrow();
            assert_eq!(original.uuid, reloaded.uuid);
            assert_eq!(original.name, reloaded.name);
            assert_eq!(original.children(), reloaded.children());
        }
        let root = ctx2.node(Context::ROOT).unwrap().borrow();
        assert!(root.decorators[0].abort_lower);
        assert!(!root.decorators[0].abort_self);
        let seq = ctx2.node(ctx2.entry().unwrap()).unwrap().borrow();
        assert!(matches!(seq.kind, NodeKind::Sequence { scoped: true }));
    }

    #[test]
    fn every_catalog_kind_round_trips() {
        let registry = Registry::new();
        let mut ctx = Context::new();
        let seq = ctx.add_node(Node::new(NodeKind::Sequence { scoped: false }, "all"));
        ctx.add_child(Context::ROOT, seq).unwrap();

        let tasks: Vec<Box<dyn salix_core::Task>> = vec![
            Box::new(DummyTask::new(ExecResult::Failed)),
            Box::new(WaitTask::new(0.25)),
            Box::new(PlaySoundTask {
                sound: "growl".into(),
                volume: 0.5,
                speed: 1.5,
            }),
            Box::new(FireEventTask {
                name: "Explode".into(),
                args: "radius=2".into(),
            }),
            Box::new(MoveToTask::new("Target", 0.75)),
            Box::new(AttackTask::new("Enemy", 12.0)),
            Box::new(RandomPointTask::new("Wander", 6.0)),
            Box::new(KeepDistanceTask::new("Threat", 8.0)),
            Box::new(SetValueTask::new("B", "A")),
            Box::new(MakeNoiseTask { volume: 0.4 }),
        ];
        for (i, task) in tasks.into_iter().enumerate() {
            let mut node = Node::new(NodeKind::Task(task), format!("task {i}"));
            node.canvas_uv = Vec2::new(i as f32 * 0.1, 0.5);
            let index = ctx.add_node(node);
            ctx.add_child(seq, index).unwrap();
        }

        let mut cooldown = AttachedDecorator::new(Box::new(CooldownDecorator::new(1.5)));
        cooldown.abort_self = true;
        ctx.add_decorator(seq, cooldown).unwrap();
        ctx.add_decorator(
            seq,
            AttachedDecorator::new(Box::new(WatchValueDecorator::when_equals("Mode", "hunt"))),
        )
        .unwrap();
        let mut see = CanSeeDecorator::new("Enemy", 35.0, 12.0);
        see.raycast = true;
        see.reverse = true;
        ctx.add_decorator(seq, AttachedDecorator::new(Box::new(see)))
            .unwrap();
        let mut near = IsInRangeDecorator::new("Enemy", 3.0);
        near.reverse = true;
        ctx.add_decorator(seq, AttachedDecorator::new(Box::new(near)))
            .unwrap();
        ctx.add_decorator(
            seq,
            AttachedDecorator::new(Box::new(DummyDecorator::new(true))),
        )
        .unwrap();

        let bytes = save_board(&registry, &ctx);
        let (registry2, ctx2) = load_board(&bytes, &full_kinds()).unwrap();
        assert_eq!(save_board(&registry2, &ctx2), bytes);

        // Spot-check decoded fields.
        let seq2 = ctx2.node(ctx2.entry().unwrap()).unwrap().borrow();
        assert_eq!(seq2.decorators.len(), 5);
        assert!(seq2.decorators[0].abort_self);
        let children = seq2.children().to_vec();
        drop(seq2);
        let wait = ctx2.node(children[1]).unwrap().borrow();
        assert_eq!(wait.task::<WaitTask>().unwrap().time, 0.25);
    }

    #[test]
    fn missing_magic_is_rejected() {
        let (registry, ctx) = alert_board();
        let mut bytes = save_board(&registry, &ctx);
        let at = bytes
            .windows(4)
            .position(|w| w == MAGIC)
            .expect("magic present");
        bytes[at] = b'X';
        match load_board(&bytes, &full_kinds()) {
            Err(LoadError::BadMagic { found }) => assert_eq!(&found[1..], b"TED"),
            other => panic!("expected BadMagic, got {other:?}"),
        }
    }

    #[test]
    fn future_versions_are_rejected() {
        let (registry, ctx) = alert_board();
        let mut registry_block = Encoder::new();
        write_registry(&registry, &mut registry_block);
        let offset = registry_block.bytes().len();

        let mut bytes = save_board(&registry, &ctx);
        // The context block starts with u32 node_count; the major version
        // byte follows it.
        bytes[offset + 4] = 9;
        match load_board(&bytes, &full_kinds()) {
            Err(LoadError::UnsupportedVersion { major: 9, .. }) => {}
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn truncation_is_rejected() {
        let (registry, ctx) = alert_board();
        let bytes = save_board(&registry, &ctx);
        for cut in [bytes.len() - 3, bytes.len() / 2, 2] {
            match load_board(&bytes[..cut], &full_kinds()) {
                Err(LoadError::TruncatedStream) => {}
                other => panic!("expected TruncatedStream at {cut}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        let (registry, ctx) = alert_board();
        let bytes = save_board(&registry, &ctx);

        let mut no_tasks = KindRegistry::new();
        no_tasks.add_decorator::<WatchValueDecorator>();
        match load_board(&bytes, &no_tasks) {
            Err(LoadError::UnknownNodeKind(kind)) => assert_eq!(kind, "TaskWait"),
            other => panic!("expected UnknownNodeKind, got {other:?}"),
        }

        let mut no_decorators = KindRegistry::new();
        no_decorators.add_task::<WaitTask>();
        match load_board(&bytes, &no_decorators) {
            Err(LoadError::UnknownDecoratorKind(kind)) => assert_eq!(kind, "DecoWatchValue"),
            other => panic!("expected UnknownDecoratorKind, got {other:?}"),
        }
    }

    #[test]
    fn pre_magic_minor_version_loads_without_the_fourcc() {
        // Hand-built 1.1 stream: no magic, lod present, empty tree.
        let mut w = Encoder::new();
        write_registry(&Registry::new(), &mut w);
        w.write_u32(0); // node count
        w.write_u8(1); // major
        w.write_u8(1); // minor
        w.write_i32(7); // lod
        w.write_str("Root");
        w.write_u64(0); // decorators
        w.write_vec2(Vec2::new(0.5, 0.5));
        w.write_i32(-1); // no entry

        let (_, ctx) = load_board(w.bytes(), &full_kinds()).unwrap();
        assert_eq!(ctx.lod, 7);
        assert!(ctx.entry().is_none());
    }

    #[test]
    fn pre_v1_nodes_get_fresh_uuids_and_the_default_board_name() {
        // Registry flag with version 0 carries no board name.
        let mut w = Encoder::new();
        w.write_u32(0); // version 0, zero entries
        w.write_u32(1); // node count
        w.write_u8(0); // major 0: no uuids in the node list
        w.write_u8(0); // minor 0: no lod either
        w.write_str("TaskDummy");
        // Root body.
        w.write_str("Root");
        w.write_u64(0);
        w.write_vec2(Vec2::new(0.5, 0.5));
        w.write_i32(0);
        // Task body.
        w.write_str("legacy");
        w.write_u64(0);
        w.write_vec2(Vec2::new(0.5, 0.5));
        w.write_u8(ExecResult::Success as u8);

        let (registry, ctx) = load_board(w.bytes(), &full_kinds()).unwrap();
        assert_eq!(registry.board_name(), "Board");
        assert_eq!(ctx.lod, 0);
        let entry = ctx.entry().unwrap();
        let node = ctx.node(entry).unwrap().borrow();
        assert_eq!(node.name, "legacy");
        assert!(!node.uuid.is_nil());
        assert_eq!(node.task::<DummyTask>().unwrap().expect, ExecResult::Success);
    }

    #[test]
    fn out_of_range_child_indices_are_rejected() {
        let mut w = Encoder::new();
        write_registry(&Registry::new(), &mut w);
        w.write_u32(0);
        w.write_u8(VERSION_MAJOR);
        w.write_u8(VERSION_MINOR);
        w.write_raw(&MAGIC);
        w.write_i32(0);
        w.write_str("Root");
        w.write_u64(0);
        w.write_vec2(Vec2::new(0.5, 0.5));
        w.write_i32(3); // entry points past the node list

        match load_board(w.bytes(), &full_kinds()) {
            Err(LoadError::BadIndex(3)) => {}
            other => panic!("expected BadIndex, got {other:?}"),
        }
    }

    #[test]
    fn files_round_trip() {
        let (registry, ctx) = alert_board();
        let path = std::env::temp_dir().join(format!("salix-codec-{}.bt", std::process::id()));
        save_file(&path, &registry, &ctx).unwrap();
        let loaded = load_file(&path, &full_kinds());
        std::fs::remove_file(&path).ok();
        let (registry2, ctx2) = loaded.unwrap();
        assert_eq!(save_board(&registry2, &ctx2), save_board(&registry, &ctx));
    }
}
