//! Collapsible version/section rows.
//!
//! A report page holds one block per tested version. Each version block has a
//! clickable handler icon and a table of section rows; a section row may be
//! followed by a sibling block of subsection rows, which nest the same way to
//! any depth. Rows name their parent through a relational class key
//! (`parent-<versionId>-0` for top-level sections, `parent-<sectionId>` below
//! that).
//!
//! Construction walks the markup depth-first once. Every structural lookup is
//! optional: a container without an identifier, handler, or block is recorded
//! as inert and left untouched, and the rest of the page still works.

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FoldId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldState {
    Open,
    Closed,
}

impl FoldState {
    /// Transition the next click applies.
    pub fn next_action(self) -> Direction {
        match self {
            Self::Open => Direction::Close,
            Self::Closed => Direction::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

impl Direction {
    fn resulting_state(self) -> FoldState {
        match self {
            Self::Open => FoldState::Open,
            Self::Close => FoldState::Closed,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Close => f.write_str("close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Version,
    Section,
}

/// Why a container never became interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InertReason {
    MissingId,
    MissingHandler,
    MissingTable,
    /// Section row without a following subsections block.
    Leaf,
}

impl fmt::Display for InertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingId => "missing-id",
            Self::MissingHandler => "missing-handler",
            Self::MissingTable => "missing-table",
            Self::Leaf => "leaf",
        };
        f.write_str(label)
    }
}

/// Read-only view of one node, keyed by identifiers rather than arena slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSummary {
    pub id: String,
    pub kind: NodeKind,
    /// `None` for leaf sections, which have nothing to fold.
    pub state: Option<FoldState>,
    pub children: Vec<String>,
}

pub(crate) trait Collapsible {
    fn block(&self) -> Option<NodeId>;
    fn icon(&self) -> NodeId;
    fn state(&self) -> FoldState;
    fn set_state(&mut self, state: FoldState);

    fn close(&mut self, dom: &mut Dom, config: &TreeConfig) -> Result<()> {
        let Some(block) = self.block() else {
            return Ok(());
        };
        dom.class_add(block, &config.hidden_class)?;
        self.toggle_handler(dom, config, Direction::Close)
    }

    fn open(&mut self, dom: &mut Dom, config: &TreeConfig) -> Result<()> {
        let Some(block) = self.block() else {
            return Ok(());
        };
        dom.class_remove(block, &config.hidden_class)?;
        self.toggle_handler(dom, config, Direction::Open)
    }

    /// Records which transition the next click applies and swaps the icon.
    fn toggle_handler(
        &mut self,
        dom: &mut Dom,
        config: &TreeConfig,
        direction: Direction,
    ) -> Result<()> {
        self.set_state(direction.resulting_state());
        dom.set_attr(self.icon(), "src", config.icon(direction))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VersionNode {
    pub(crate) id: String,
    pub(crate) handler: NodeId,
    pub(crate) icon: NodeId,
    pub(crate) table: NodeId,
    pub(crate) sections: Vec<FoldId>,
    pub(crate) state: FoldState,
}

impl Collapsible for VersionNode {
    fn block(&self) -> Option<NodeId> {
        Some(self.table)
    }

    fn icon(&self) -> NodeId {
        self.icon
    }

    fn state(&self) -> FoldState {
        self.state
    }

    fn set_state(&mut self, state: FoldState) {
        self.state = state;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SectionNode {
    pub(crate) id: String,
    pub(crate) row: NodeId,
    pub(crate) icon: NodeId,
    pub(crate) subsections: Option<NodeId>,
    pub(crate) children: Vec<FoldId>,
    pub(crate) state: FoldState,
}

impl Collapsible for SectionNode {
    fn block(&self) -> Option<NodeId> {
        self.subsections
    }

    fn icon(&self) -> NodeId {
        self.icon
    }

    fn state(&self) -> FoldState {
        self.state
    }

    fn set_state(&mut self, state: FoldState) {
        self.state = state;
    }
}

#[derive(Debug, Clone)]
pub(crate) enum FoldNode {
    Version(VersionNode),
    Section(SectionNode),
}

impl FoldNode {
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Version(node) => &node.id,
            Self::Section(node) => &node.id,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Self::Version(_) => NodeKind::Version,
            Self::Section(_) => NodeKind::Section,
        }
    }

    pub(crate) fn handler(&self) -> NodeId {
        match self {
            Self::Version(node) => node.handler,
            Self::Section(node) => node.row,
        }
    }

    pub(crate) fn children(&self) -> &[FoldId] {
        match self {
            Self::Version(node) => &node.sections,
            Self::Section(node) => &node.children,
        }
    }

    pub(crate) fn is_expandable(&self) -> bool {
        self.as_collapsible().block().is_some()
    }

    pub(crate) fn state(&self) -> Option<FoldState> {
        self.is_expandable().then(|| self.as_collapsible().state())
    }

    fn as_collapsible(&self) -> &dyn Collapsible {
        match self {
            Self::Version(node) => node,
            Self::Section(node) => node,
        }
    }

    fn as_collapsible_mut(&mut self) -> &mut dyn Collapsible {
        match self {
            Self::Version(node) => node,
            Self::Section(node) => node,
        }
    }
}

/// Arena of every node built from one page. Parents own an ordered list of
/// their children; nothing is re-queried from the document after load.
#[derive(Debug, Clone, Default)]
pub(crate) struct FoldTree {
    nodes: Vec<FoldNode>,
    // Identity element (version container or section row) to node.
    by_element: HashMap<NodeId, FoldId>,
    roots: Vec<FoldId>,
    inert: Vec<(NodeId, InertReason)>,
}

impl FoldTree {
    /// Builds one version node for every container matching the configured
    /// selector, in document order.
    pub(crate) fn build(
        dom: &mut Dom,
        listeners: &mut ListenerStore,
        config: &TreeConfig,
    ) -> Result<Self> {
        let mut tree = Self::default();
        for container in dom.query_selector_all(&config.version_selector)? {
            tree.attach_version(dom, listeners, config, container)?;
        }
        Ok(tree)
    }

    pub(crate) fn attach_version(
        &mut self,
        dom: &mut Dom,
        listeners: &mut ListenerStore,
        config: &TreeConfig,
        container: NodeId,
    ) -> Result<Option<FoldId>> {
        if self.visited(container) {
            return Ok(None);
        }
        let Some(id) = element_ident(dom, container) else {
            self.mark_inert(dom, container, InertReason::MissingId);
            return Ok(None);
        };
        let table =
            dom.first_descendant_where(container, |e| e.tag_name.eq_ignore_ascii_case("table"));
        // Section icons inside the table carry the same class.
        let Some(handler) = dom.descendant_elements(container).into_iter().find(|node| {
            dom.class_contains(*node, &config.handler_class)
                && table.is_none_or(|table| !dom.contains(table, *node))
        }) else {
            self.mark_inert(dom, container, InertReason::MissingHandler);
            return Ok(None);
        };
        let Some(table) = table else {
            self.mark_inert(dom, container, InertReason::MissingTable);
            return Ok(None);
        };

        let key = config.top_level_key(&id);
        let mut sections = Vec::new();
        for row in rows_with_key(dom, container, &key) {
            if let Some(section) = self.attach_section(dom, listeners, config, row)? {
                sections.push(section);
            }
        }

        let icon = icon_target(dom, handler);
        tracing::debug!(version = %id, sections = sections.len(), "attached version");
        let fold = self.push(
            container,
            FoldNode::Version(VersionNode {
                id,
                handler,
                icon,
                table,
                sections,
                state: FoldState::Open,
            }),
        );
        self.initialize(dom, listeners, config, fold)?;
        self.roots.push(fold);
        Ok(Some(fold))
    }

    pub(crate) fn attach_section(
        &mut self,
        dom: &mut Dom,
        listeners: &mut ListenerStore,
        config: &TreeConfig,
        row: NodeId,
    ) -> Result<Option<FoldId>> {
        // A row carrying two parent keys belongs to whichever parent reached it first.
        if self.visited(row) {
            return Ok(None);
        }
        let Some(id) = element_ident(dom, row) else {
            self.mark_inert(dom, row, InertReason::MissingId);
            return Ok(None);
        };

        let subsections = dom
            .next_element_sibling(row)
            .filter(|sibling| dom.class_contains(*sibling, &config.subsections_class));
        let icon = dom
            .first_descendant_where(row, |e| has_class(e, &config.handler_class))
            .map_or(row, |handler| icon_target(dom, handler));

        let Some(block) = subsections else {
            self.mark_inert(dom, row, InertReason::Leaf);
            let fold = self.push(
                row,
                FoldNode::Section(SectionNode {
                    id,
                    row,
                    icon,
                    subsections: None,
                    children: Vec::new(),
                    state: FoldState::Open,
                }),
            );
            return Ok(Some(fold));
        };

        let key = config.child_key(&id);
        let mut children = Vec::new();
        for sub in rows_with_key(dom, block, &key) {
            let child = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
                self.attach_section(dom, listeners, config, sub)
            })?;
            if let Some(child) = child {
                children.push(child);
            }
        }

        tracing::debug!(section = %id, subsections = children.len(), "attached section");
        let fold = self.push(
            row,
            FoldNode::Section(SectionNode {
                id,
                row,
                icon,
                subsections: Some(block),
                children,
                state: FoldState::Open,
            }),
        );
        self.initialize(dom, listeners, config, fold)?;
        Ok(Some(fold))
    }

    /// Shared start state for both kinds: block visible, open icon, one click
    /// listener on the handler.
    fn initialize(
        &mut self,
        dom: &mut Dom,
        listeners: &mut ListenerStore,
        config: &TreeConfig,
        fold: FoldId,
    ) -> Result<()> {
        let node = &mut self.nodes[fold.0];
        node.as_collapsible_mut().open(dom, config)?;
        listeners.add(node.handler(), "click", Listener { fold });
        Ok(())
    }

    /// Applies the transition the node's state calls for. Leaves do nothing.
    pub(crate) fn activate(
        &mut self,
        dom: &mut Dom,
        config: &TreeConfig,
        fold: FoldId,
    ) -> Result<Option<Direction>> {
        let node = self
            .nodes
            .get_mut(fold.0)
            .ok_or_else(|| Error::UnknownNode(format!("fold-{}", fold.0)))?;
        let Some(state) = node.state() else {
            return Ok(None);
        };
        let direction = state.next_action();
        let collapsible = node.as_collapsible_mut();
        match direction {
            Direction::Open => collapsible.open(dom, config)?,
            Direction::Close => collapsible.close(dom, config)?,
        }
        tracing::trace!(node = %node.id(), %direction, "toggled");
        Ok(Some(direction))
    }

    fn push(&mut self, element: NodeId, node: FoldNode) -> FoldId {
        let fold = FoldId(self.nodes.len());
        self.nodes.push(node);
        self.by_element.insert(element, fold);
        fold
    }

    fn visited(&self, element: NodeId) -> bool {
        self.by_element.contains_key(&element)
            || self.inert.iter().any(|(inert, _)| *inert == element)
    }

    fn mark_inert(&mut self, dom: &Dom, element: NodeId, reason: InertReason) {
        tracing::debug!(
            element = %element_label(dom, element),
            %reason,
            "container left inert"
        );
        self.inert.push((element, reason));
    }

    pub(crate) fn node(&self, fold: FoldId) -> Option<&FoldNode> {
        self.nodes.get(fold.0)
    }

    /// Node whose identity element carries `id`; the first such element in
    /// document order wins.
    pub(crate) fn find(&self, dom: &Dom, id: &str) -> Option<FoldId> {
        dom.by_id(id)
            .and_then(|element| self.by_element.get(&element))
            .copied()
    }

    pub(crate) fn roots(&self) -> &[FoldId] {
        &self.roots
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn inert(&self) -> &[(NodeId, InertReason)] {
        &self.inert
    }

    pub(crate) fn summary(&self, fold: FoldId) -> Option<FoldSummary> {
        let node = self.node(fold)?;
        Some(FoldSummary {
            id: node.id().to_string(),
            kind: node.kind(),
            state: node.state(),
            children: node
                .children()
                .iter()
                .filter_map(|child| self.node(*child))
                .map(|child| child.id().to_string())
                .collect(),
        })
    }
}

/// Identifier of a container, absent when the attribute is missing or empty.
fn element_ident(dom: &Dom, node_id: NodeId) -> Option<String> {
    dom.attr(node_id, "id")
        .filter(|id| !id.is_empty())
        .map(|id| normalize_ident(&id))
}

/// Rows under `scope` that carry the relational key `key` as a class token.
fn rows_with_key(dom: &Dom, scope: NodeId, key: &str) -> Vec<NodeId> {
    dom.descendant_elements(scope)
        .into_iter()
        .filter(|row| {
            dom.element(*row).is_some_and(|element| {
                element.tag_name.eq_ignore_ascii_case("tr") && has_class_normalized(element, key)
            })
        })
        .collect()
}

/// The element whose `src` shows the fold state: the handler when it is an
/// image, else the first image inside it, else the handler itself.
///
/// Section rows pass their `handler`-classed descendant here, never the row,
/// so status images elsewhere in the row keep their `src`.
fn icon_target(dom: &Dom, handler: NodeId) -> NodeId {
    if dom.is_tag(handler, "img") {
        return handler;
    }
    dom.first_descendant_where(handler, |e| e.tag_name.eq_ignore_ascii_case("img"))
        .unwrap_or(handler)
}

pub(crate) fn element_label(dom: &Dom, node: NodeId) -> String {
    if let Some(id) = dom.attr(node, "id") {
        if !id.is_empty() {
            return format!("#{id}");
        }
    }
    dom.tag_name(node)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("node-{}", node.0))
}
