use super::*;

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Attributes keep source order so serialized output is stable across
/// class additions and removals.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub(crate) fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
    // Elements whose class attribute was created by `class_add`.
    added_class_attr: HashSet<NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
            added_class_attr: HashSet::new(),
        }
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let element = Element { tag_name, attrs };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self.attr(id, "id") {
            // First occurrence wins, as getElementById does.
            self.id_index.entry(normalize_ident(&id_attr)).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn is_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.tag_name(node_id)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attr(name))
            .map(ToOwned::to_owned)
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_or_err(node_id, "attribute")?
            .set_attr(name, value);
        Ok(())
    }

    /// Looks an id up in NFC, so composed and decomposed spellings of the
    /// same id find the same element.
    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(&normalize_ident(id)).copied()
    }

    pub(crate) fn class_contains(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|element| has_class(element, class_name))
    }

    pub(crate) fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self.element_or_err(node_id, "classList")?;
        if has_class(element, class_name) {
            return Ok(());
        }
        let created = element.attr("class").is_none();
        let mut classes: Vec<&str> = class_list(element).collect();
        classes.push(class_name);
        let value = classes.join(" ");
        element.set_attr("class", &value);
        if created {
            self.added_class_attr.insert(node_id);
        }
        Ok(())
    }

    /// Removes one class token. An emptied attribute stays as `class=""`
    /// unless `class_add` created it, in which case it goes away again.
    pub(crate) fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self.element_or_err(node_id, "classList")?;
        if !has_class(element, class_name) {
            return Ok(());
        }
        let value = class_list(element)
            .filter(|token| *token != class_name)
            .collect::<Vec<_>>()
            .join(" ");
        if value.is_empty() && self.added_class_attr.remove(&node_id) {
            self.remove_attr(node_id, "class")?;
        } else {
            self.element_or_err(node_id, "classList")?
                .set_attr("class", &value);
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        self.element_or_err(node_id, "attribute")?.remove_attr(name);
        Ok(())
    }

    fn element_or_err(&mut self, node_id: NodeId, what: &str) -> Result<&mut Element> {
        self.element_mut(node_id).ok_or_else(|| {
            Error::UnknownNode(format!("{what} target node-{} is not an element", node_id.0))
        })
    }

    /// Whether `node_id` is `ancestor` or sits somewhere below it.
    pub(crate) fn contains(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let children = &self.nodes[parent.0].children;
        let pos = children.iter().position(|id| *id == node_id)?;
        children
            .iter()
            .skip(pos + 1)
            .copied()
            .find(|sibling| self.element(*sibling).is_some())
    }

    pub(crate) fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        // Iterative so arbitrarily deep report nesting cannot exhaust the stack.
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            if matches!(self.nodes[current.0].node_type, NodeType::Element(_)) {
                out.push(current);
            }
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    pub(crate) fn descendant_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, &mut out);
        }
        out
    }

    pub(crate) fn first_descendant_where(
        &self,
        node_id: NodeId,
        predicate: impl Fn(&Element) -> bool,
    ) -> Option<NodeId> {
        self.descendant_elements(node_id)
            .into_iter()
            .find(|candidate| self.element(*candidate).is_some_and(&predicate))
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        if let Some(id) = selector.id_only() {
            return Ok(self.by_id(id).into_iter().collect());
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        ids.retain(|candidate| self.matches(*candidate, &selector.steps));
        Ok(ids)
    }

    /// Right-to-left match of `steps` with `node_id` as the subject.
    pub(crate) fn matches(&self, node_id: NodeId, steps: &[Step]) -> bool {
        let Some((last, rest)) = steps.split_last() else {
            return false;
        };
        if !self.matches_compound(node_id, &last.compound) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.relation {
            Some(Relation::Child) => self
                .parent(node_id)
                .is_some_and(|parent| self.matches(parent, rest)),
            // Every ancestor is a candidate, so `div > p span` can still
            // match when the nearest `p` sits under the wrong parent.
            _ => {
                let mut cursor = self.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
        }
    }

    fn matches_compound(&self, node_id: NodeId, compound: &Compound) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if compound
            .tag
            .as_deref()
            .is_some_and(|tag| !element.tag_name.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        if let Some(id) = &compound.id {
            let own = element.attr("id").map(normalize_ident);
            if own.as_deref() != Some(normalize_ident(id).as_str()) {
                return false;
            }
        }
        compound
            .classes
            .iter()
            .all(|class_name| has_class(element, class_name))
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            if let NodeType::Text(text) = &self.nodes[current.0].node_type {
                out.push_str(text);
            }
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.dump_node_into(node_id, &mut out);
        out
    }

    fn dump_node_into(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            let node = &self.nodes[node_id.0];
            match &node.node_type {
                NodeType::Document => {}
                NodeType::Text(text) => {
                    out.push_str(&escape_markup(text, false));
                    return;
                }
                NodeType::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (name, value) in &element.attrs {
                        out.push_str(&format!(" {name}=\"{}\"", escape_markup(value, true)));
                    }
                    out.push('>');
                    if is_void_tag(&element.tag_name) {
                        return;
                    }
                }
            }
            for child in &node.children {
                self.dump_node_into(*child, out);
            }
            if let NodeType::Element(element) = &node.node_type {
                out.push_str(&format!("</{}>", element.tag_name));
            }
        });
    }
}
