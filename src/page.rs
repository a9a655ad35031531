use super::*;

/// A loaded report page with its collapsible rows wired up.
///
/// Loading parses the markup and builds every version and section node before
/// returning, so no click can observe a half-built tree.
pub struct ReportPage {
    dom: Dom,
    listeners: ListenerStore,
    tree: FoldTree,
    config: TreeConfig,
    trace: bool,
    trace_events: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl ReportPage {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, TreeConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut dom = parse_html(html)?;
        let mut listeners = ListenerStore::default();
        let tree = FoldTree::build(&mut dom, &mut listeners, &config)?;
        tracing::debug!(
            nodes = tree.len(),
            versions = tree.roots().len(),
            inert = tree.inert().len(),
            "report page loaded"
        );
        Ok(Self {
            dom,
            listeners,
            tree,
            config,
            trace: false,
            trace_events: true,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Turns tracing on and records a snapshot of what load built: one line
    /// per node, then one per inert container.
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
        if enabled {
            self.trace_tree_snapshot();
        }
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        if self.trace_logs.len() > self.trace_log_limit {
            let excess = self.trace_logs.len() - self.trace_log_limit;
            self.trace_logs.drain(..excess);
        }
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, "click")?;
        Ok(())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    /// Toggles the node identified by `id` without going through an event.
    /// Returns the transition applied, or `None` for a leaf section.
    pub fn toggle(&mut self, id: &str) -> Result<Option<Direction>> {
        let fold = self.find(id)?;
        let applied = self.tree.activate(&mut self.dom, &self.config, fold)?;
        if let Some(direction) = applied {
            self.trace_tree_line(format!("[tree] {direction} #{id}"));
        }
        Ok(applied)
    }

    pub fn fold_state(&self, id: &str) -> Result<Option<FoldState>> {
        Ok(self.node(id)?.state)
    }

    /// What the next click on `id` will do; `None` when it does nothing.
    pub fn next_action(&self, id: &str) -> Result<Option<Direction>> {
        Ok(self.fold_state(id)?.map(FoldState::next_action))
    }

    pub fn node(&self, id: &str) -> Result<FoldSummary> {
        let fold = self.find(id)?;
        self.tree
            .summary(fold)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))
    }

    pub fn children(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.node(id)?.children)
    }

    /// Identifiers of the version nodes, in document order.
    pub fn versions(&self) -> Vec<String> {
        self.tree
            .roots()
            .iter()
            .filter_map(|fold| self.tree.node(*fold))
            .map(|node| node.id().to_string())
            .collect()
    }

    /// Identifiers of every version and section node, depth-first in
    /// document order.
    pub fn fold_ids(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.tree.len());
        let mut stack: Vec<FoldId> = self.tree.roots().iter().rev().copied().collect();
        while let Some(fold) = stack.pop() {
            let Some(node) = self.tree.node(fold) else {
                continue;
            };
            out.push(node.id().to_string());
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Containers left non-interactive at load, labelled `#id` or by tag.
    pub fn inert(&self) -> Vec<(String, InertReason)> {
        self.tree
            .inert()
            .iter()
            .map(|(element, reason)| (element_label(&self.dom, *element), *reason))
            .collect()
    }

    pub fn is_bound(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.listeners.has(target, "click"))
    }

    pub fn bound_handler_count(&self) -> usize {
        self.listeners.bound_nodes("click")
    }

    pub fn is_hidden(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.class_contains(target, &self.config.hidden_class))
    }

    /// Current icon of node `id`.
    pub fn icon_src(&self, id: &str) -> Result<Option<String>> {
        let fold = self.find(id)?;
        let node = self
            .tree
            .node(fold)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))?;
        let icon = match node {
            FoldNode::Version(version) => version.icon,
            FoldNode::Section(section) => section.icon,
        };
        Ok(self.dom.attr(icon, "src"))
    }

    pub fn assert_hidden(&self, selector: &str) -> Result<()> {
        self.assert_visibility(selector, true)
    }

    pub fn assert_visible(&self, selector: &str) -> Result<()> {
        self.assert_visibility(selector, false)
    }

    pub fn assert_icon(&self, id: &str, expected: &str) -> Result<()> {
        let actual = self.icon_src(id)?.unwrap_or_default();
        if actual != expected {
            let element = self.find_element(id)?;
            return Err(Error::AssertionFailed {
                selector: format!("#{id}"),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(element),
            });
        }
        Ok(())
    }

    pub fn assert_state(&self, id: &str, expected: FoldState) -> Result<()> {
        let actual = self.fold_state(id)?;
        if actual != Some(expected) {
            let element = self.find_element(id)?;
            return Err(Error::AssertionFailed {
                selector: format!("#{id}"),
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
                dom_snippet: self.node_snippet(element),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    /// Text of the first match, as a row label reads on screen.
    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    /// Serializes the whole document.
    pub fn dump_document(&self) -> String {
        self.dom.dump_node(self.dom.root)
    }

    fn assert_visibility(&self, selector: &str, expect_hidden: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let hidden = self.dom.class_contains(target, &self.config.hidden_class);
        if hidden != expect_hidden {
            let describe = |hidden: bool| if hidden { "hidden" } else { "visible" };
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: describe(expect_hidden).to_string(),
                actual: describe(hidden).to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let mut event = EventState::new(event_type, target);

        // Target first, then each ancestor up to the document.
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            event.current_target = node;
            self.invoke_listeners(node, &mut event)?;
            cursor = self.dom.parent(node);
        }

        self.trace_event_done(&event);
        Ok(event)
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut EventState) -> Result<()> {
        for listener in self.listeners.get(node, &event.event_type) {
            let applied = self
                .tree
                .activate(&mut self.dom, &self.config, listener.fold)?;
            event.handled += 1;
            if let Some(direction) = applied {
                let label = self.trace_node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} current={} -> {direction}",
                    event.event_type, label
                ));
            }
        }
        Ok(())
    }

    fn find(&self, id: &str) -> Result<FoldId> {
        self.tree
            .find(&self.dom, id)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))
    }

    fn find_element(&self, id: &str) -> Result<NodeId> {
        self.dom
            .by_id(id)
            .ok_or_else(|| Error::SelectorNotFound(format!("#{id}")))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        snippet(&self.dom.dump_node(node_id), 200)
    }

    fn trace_node_label(&self, node: NodeId) -> String {
        element_label(&self.dom, node)
    }

    fn trace_tree_snapshot(&mut self) {
        let mut lines = Vec::new();
        for fold in self.tree.roots().to_vec() {
            self.collect_snapshot_lines(fold, 0, &mut lines);
        }
        for (element, reason) in self.inert() {
            lines.push(format!("[tree] inert {element} reason={reason}"));
        }
        for line in lines {
            self.trace_tree_line(line);
        }
    }

    fn collect_snapshot_lines(&self, fold: FoldId, depth: usize, out: &mut Vec<String>) {
        let Some(node) = self.tree.node(fold) else {
            return;
        };
        let kind = match node.kind() {
            NodeKind::Version => "version",
            NodeKind::Section => "section",
        };
        let state = match node.state() {
            Some(FoldState::Open) => "open",
            Some(FoldState::Closed) => "closed",
            None => "leaf",
        };
        out.push(format!(
            "[tree] {}{kind} #{} {state} children={}",
            "  ".repeat(depth),
            node.id(),
            node.children().len()
        ));
        for child in node.children() {
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
                self.collect_snapshot_lines(*child, depth + 1, out)
            });
        }
    }

    fn trace_event_done(&mut self, event: &EventState) {
        let target_label = self.trace_node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} handled={}",
            event.event_type, target_label, event.handled
        ));
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    fn trace_tree_line(&mut self, line: String) {
        if self.trace {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }
}
