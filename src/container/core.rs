use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossterm::event::KeyCode;
use serde_json::json;

use crate::error::{DeckError, Result};
use crate::events::{Event, EventDistributor, EventFilter, MouseEvent, SubscriberHandle};
use crate::geometry::{Point, Rect, Size};
use crate::logging::{json_kv, LogEvent, LogLevel, Logger};
use crate::metrics::TreeSnapshot;
use crate::style::{BorderGlyphs, CellStyle, Color, LineStyle};
use crate::terminal::CellGrid;
use crate::widget::{EventFlow, Widget};

use super::focus::FocusTracker;
use super::layout;
use super::options::{self, ContainerSpec, SplitKind};

const LOG_TARGET: &str = "deck::container";

/// Index of a container in the tree arena. Stable for the lifetime of
/// the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy)]
pub(crate) struct Split {
    pub kind: SplitKind,
    pub percent: u8,
}

pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub children: Option<(NodeId, NodeId)>,
    pub split: Option<Split>,
    pub border: LineStyle,
    /// Effective border color: the node's own value or the nearest
    /// ancestor's, resolved at build time.
    pub border_color: Color,
    pub focus_group: u32,
    pub focus_skip: bool,
    pub widget: Option<Box<dyn Widget>>,
    pub rect: Rect,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("split", &self.split)
            .field("border", &self.border)
            .field("border_color", &self.border_color)
            .field("focus_group", &self.focus_group)
            .field("focus_skip", &self.focus_skip)
            .field("widget", &self.widget.as_ref().map(|_| "<dyn Widget>"))
            .field("rect", &self.rect)
            .finish()
    }
}

/// Which traversal a bound key triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusAction {
    Next,
    Previous,
    GroupNext(u32),
    GroupPrevious(u32),
}

/// The container tree: a binary tiling of the terminal with a focus
/// tracker and a cell grid sink.
///
/// Nodes live in an arena stored in preorder, so walking indices walks
/// the tree parents-first, left-to-right; traversal scans rely on this.
/// The shape and options are immutable after construction; only
/// rectangles and focus change at runtime.
pub struct ContainerTree {
    nodes: Vec<Node>,
    root: NodeId,
    focus: FocusTracker,
    grid: Box<dyn CellGrid + Send>,
    bindings: HashMap<KeyCode, FocusAction>,
    logger: Option<Logger>,
    draws: u64,
    consumed_events: u64,
    last_size: Option<Size>,
}

impl std::fmt::Debug for ContainerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerTree")
            .field("nodes", &self.nodes)
            .field("root", &self.root)
            .field("focus", &self.focus)
            .field("grid", &"<dyn CellGrid>")
            .field("bindings", &self.bindings)
            .field("logger", &self.logger)
            .field("draws", &self.draws)
            .field("consumed_events", &self.consumed_events)
            .field("last_size", &self.last_size)
            .finish()
    }
}

/// Handle used to share one tree between the caller and its event
/// subscription.
pub type SharedTree = Arc<Mutex<ContainerTree>>;

impl ContainerTree {
    /// Build the tree described by `spec`, painting into `grid`. Fails
    /// with a config error on an invalid description; no partial tree is
    /// returned. Rectangles are undefined until the first draw.
    pub fn new(grid: Box<dyn CellGrid + Send>, spec: ContainerSpec) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut bindings = HashMap::new();
        let root = build_node(&mut nodes, &mut bindings, None, None, spec)?;
        Ok(Self {
            nodes,
            root,
            focus: FocusTracker::new(root),
            grid,
            bindings,
            logger: None,
            draws: 0,
            consumed_events: 0,
            last_size: None,
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn into_shared(self) -> SharedTree {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_leaf()
    }

    /// The rectangle assigned during the last layout pass.
    pub fn rect_of(&self, id: NodeId) -> Rect {
        self.nodes[id.0].rect
    }

    /// The effective (possibly inherited) border color.
    pub fn border_color_of(&self, id: NodeId) -> Color {
        self.nodes[id.0].border_color
    }

    pub fn container_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    pub fn focused(&self) -> NodeId {
        self.focus.active()
    }

    /// The most specific container containing `p`, or none outside the
    /// terminal. Meaningful after the first draw.
    pub fn point_container(&self, p: Point) -> Option<NodeId> {
        layout::node_at(&self.nodes, self.root, p)
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            draws: self.draws,
            containers: self.nodes.len(),
            consumed_events: self.consumed_events,
            last_size: self.last_size,
        }
    }

    /// Lay out against the sink's current size and repaint everything:
    /// border frames first, then leaf widgets with their inner
    /// rectangles. Layout and sink failures abort the draw; earlier
    /// paints may already be applied, so callers clear and retry.
    pub fn draw(&mut self) -> Result<()> {
        let size = self.grid.size();
        layout::assign_rects(&mut self.nodes, self.root, size)?;
        self.last_size = Some(size);
        for idx in 0..self.nodes.len() {
            self.draw_node(NodeId(idx))?;
        }
        self.draws += 1;
        Ok(())
    }

    /// Route one event through the tree: mouse events drive the focus
    /// gesture and reach the widget under the pointer, key events
    /// trigger traversal bindings or reach the focused widget. Ends
    /// with a full redraw.
    pub fn handle_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(*key)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse)?,
            // Nothing to update now; the redraw below re-layouts from
            // the sink size.
            Event::Resize(_) => {}
            Event::Error(_) => return Ok(()),
        }
        self.draw()
    }

    /// Subscribe `tree` to keyboard, mouse and resize events. Routing
    /// failures (for example a resize below the border minimum) are
    /// surfaced as error events rather than ending the subscription.
    pub fn subscribe(tree: &SharedTree, eds: &EventDistributor) -> SubscriberHandle {
        let weak = Arc::downgrade(tree);
        let reporter = eds.reporter();
        eds.subscribe(EventFilter::input(), move |event| {
            let Some(shared) = weak.upgrade() else {
                return Ok(());
            };
            let mut tree = shared
                .lock()
                .map_err(|_| DeckError::Subscriber("container tree mutex poisoned".to_string()))?;
            if let Err(err) = tree.handle_event(event) {
                tree.log(
                    LogLevel::Warn,
                    "event_handling_failed",
                    [json_kv("reason", json!(err.to_string()))],
                );
                reporter.event(Event::Error(err.to_string()));
            }
            Ok(())
        })
    }

    fn handle_key(&mut self, key: KeyCode) -> Result<()> {
        if let Some(action) = self.bindings.get(&key).copied() {
            let before = self.focus.active();
            let scan = self.traversal_scan(action);
            let changed = match action {
                FocusAction::Next | FocusAction::GroupNext(_) => self.focus.next(&scan),
                FocusAction::Previous | FocusAction::GroupPrevious(_) => {
                    self.focus.previous(&scan)
                }
            };
            if changed {
                self.log_focus_change(before, self.focus.active());
            }
            return Ok(());
        }

        // Unbound keys belong to the focused widget; anything it leaves
        // unconsumed is discarded.
        let active = self.focus.active();
        if let Some(widget) = self.nodes[active.0].widget.as_mut() {
            let flow = widget.on_key(key)?;
            self.record_flow(active, flow);
        }
        Ok(())
    }

    fn handle_mouse(&mut self, event: &MouseEvent) -> Result<()> {
        let target = layout::node_at(&self.nodes, self.root, event.position);
        let before = self.focus.active();
        if self.focus.mouse(target, event.button) {
            self.log_focus_change(before, self.focus.active());
        }
        if let Some(id) = target {
            if let Some(widget) = self.nodes[id.0].widget.as_mut() {
                let flow = widget.on_mouse(event)?;
                self.record_flow(id, flow);
            }
        }
        Ok(())
    }

    fn record_flow(&mut self, id: NodeId, flow: EventFlow) {
        if matches!(flow, EventFlow::Consumed) {
            self.consumed_events += 1;
            self.log(
                LogLevel::Debug,
                "widget_consumed_event",
                [json_kv("container", json!(id.0))],
            );
        }
    }

    /// Preorder scan with per-node traversal eligibility. Global
    /// traversal visits non-skipped leaves; group traversal visits
    /// group members regardless of the skip flag, with group 0 matching
    /// every leaf.
    fn traversal_scan(&self, action: FocusAction) -> Vec<(NodeId, bool)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let eligible = node.is_leaf()
                    && match action {
                        FocusAction::Next | FocusAction::Previous => !node.focus_skip,
                        FocusAction::GroupNext(group) | FocusAction::GroupPrevious(group) => {
                            group == 0 || node.focus_group == group
                        }
                    };
                (NodeId(idx), eligible)
            })
            .collect()
    }

    fn draw_node(&mut self, id: NodeId) -> Result<()> {
        let rect = self.nodes[id.0].rect;
        let border = self.nodes[id.0].border;
        let color = self.nodes[id.0].border_color;
        if let Some(glyphs) = border.glyphs() {
            paint_frame(self.grid.as_mut(), rect, glyphs, CellStyle::fg(color))?;
        }
        let node = &mut self.nodes[id.0];
        if node.children.is_none() {
            if let Some(widget) = node.widget.as_mut() {
                let inner = if border.is_none() { rect } else { rect.inset() };
                widget.paint(self.grid.as_mut(), inner)?;
            }
        }
        Ok(())
    }

    fn log_focus_change(&self, from: NodeId, to: NodeId) {
        self.log(
            LogLevel::Debug,
            "focus_changed",
            [json_kv("from", json!(from.0)), json_kv("to", json!(to.0))],
        );
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        fields: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        if let Some(logger) = &self.logger {
            let _ = logger.log_event(LogEvent::with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

fn build_node(
    nodes: &mut Vec<Node>,
    bindings: &mut HashMap<KeyCode, FocusAction>,
    parent: Option<NodeId>,
    inherited_color: Option<Color>,
    spec: ContainerSpec,
) -> Result<NodeId> {
    let resolved = options::resolve(spec)?;
    let effective_color = resolved.options.border_color.or(inherited_color);

    let id = NodeId(nodes.len());
    nodes.push(Node {
        parent,
        children: None,
        split: None,
        border: resolved.options.border,
        border_color: effective_color.unwrap_or_default(),
        focus_group: resolved.options.focus_group,
        focus_skip: resolved.options.focus_skip,
        widget: resolved.widget,
        rect: Rect::default(),
    });

    if let Some(key) = resolved.options.key_next {
        register_binding(bindings, key, FocusAction::Next)?;
    }
    if let Some(key) = resolved.options.key_previous {
        register_binding(bindings, key, FocusAction::Previous)?;
    }
    for (group, keys) in &resolved.options.group_next {
        for key in keys {
            register_binding(bindings, *key, FocusAction::GroupNext(*group))?;
        }
    }
    for (group, keys) in &resolved.options.group_previous {
        for key in keys {
            register_binding(bindings, *key, FocusAction::GroupPrevious(*group))?;
        }
    }

    if let Some((kind, first_spec, second_spec)) = resolved.split {
        let first = build_node(nodes, bindings, Some(id), effective_color, first_spec)?;
        let second = build_node(nodes, bindings, Some(id), effective_color, second_spec)?;
        nodes[id.0].children = Some((first, second));
        nodes[id.0].split = Some(Split {
            kind,
            percent: resolved.options.split_percent,
        });
    }

    Ok(id)
}

fn register_binding(
    bindings: &mut HashMap<KeyCode, FocusAction>,
    key: KeyCode,
    action: FocusAction,
) -> Result<()> {
    match bindings.entry(key) {
        Entry::Occupied(existing) if *existing.get() != action => Err(DeckError::Config(format!(
            "key {key:?} is bound to conflicting focus actions"
        ))),
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(slot) => {
            slot.insert(action);
            Ok(())
        }
    }
}

fn paint_frame(
    grid: &mut dyn CellGrid,
    rect: Rect,
    glyphs: BorderGlyphs,
    style: CellStyle,
) -> Result<()> {
    // Layout rejects bordered rectangles below 2x2 before we get here.
    let left = rect.x;
    let right = rect.right() - 1;
    let top = rect.y;
    let bottom = rect.bottom() - 1;

    grid.set_cell(left, top, glyphs.top_left, style)?;
    grid.set_cell(right, top, glyphs.top_right, style)?;
    grid.set_cell(left, bottom, glyphs.bottom_left, style)?;
    grid.set_cell(right, bottom, glyphs.bottom_right, style)?;
    for x in left + 1..right {
        grid.set_cell(x, top, glyphs.horizontal, style)?;
        grid.set_cell(x, bottom, glyphs.horizontal, style)?;
    }
    for y in top + 1..bottom {
        grid.set_cell(left, y, glyphs.vertical, style)?;
        grid.set_cell(right, y, glyphs.vertical, style)?;
    }
    Ok(())
}
