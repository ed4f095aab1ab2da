//! Feeds html5ever's tree builder into an [`ArenaDom`].

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as ParsedAttribute, QualName};

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute};

/// Where a new child goes relative to an existing node.
#[derive(Clone, Copy)]
enum Slot {
    LastChildOf(ArenaNodeId),
    Before(ArenaNodeId),
}

/// Builds an arena tree from parser callbacks.
///
/// The tree builder only hands out `&self`, so the arena sits in a `RefCell`.
pub(super) struct DomBuilder {
    dom: RefCell<ArenaDom>,
}

impl DomBuilder {
    pub(super) fn new() -> Self {
        Self {
            dom: RefCell::new(ArenaDom::new()),
        }
    }

    fn place(&self, slot: Slot, child: NodeOrText<ArenaNodeId>) {
        let mut dom = self.dom.borrow_mut();
        match (slot, child) {
            (Slot::LastChildOf(parent), NodeOrText::AppendText(text)) => {
                dom.append_text(parent, &text);
            }
            (Slot::LastChildOf(parent), NodeOrText::AppendNode(node)) => dom.append(parent, node),
            (Slot::Before(sibling), NodeOrText::AppendText(text)) => {
                let node = dom.create_text(text.to_string());
                dom.insert_before(sibling, node);
            }
            (Slot::Before(sibling), NodeOrText::AppendNode(node)) => {
                dom.insert_before(sibling, node);
            }
        }
    }

    fn parent_of(&self, node: ArenaNodeId) -> Option<ArenaNodeId> {
        self.dom
            .borrow()
            .get(node)
            .and_then(|n| n.parent)
    }
}

fn owned_attrs(attrs: Vec<ParsedAttribute>) -> impl Iterator<Item = Attribute> {
    attrs.into_iter().map(|a| Attribute {
        name: a.name,
        value: a.value.to_string(),
    })
}

impl TreeSink for DomBuilder {
    type Handle = ArenaNodeId;
    type Output = ArenaDom;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> ArenaDom {
        self.dom.into_inner()
    }

    // Publisher markup is rarely valid; recover silently the way browsers do.
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> ArenaNodeId {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a ArenaNodeId) -> &'a QualName {
        static UNNAMED: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        let Some(ArenaNodeData::Element { name, .. }) = dom.get(*target).map(|n| &n.data) else {
            return &UNNAMED;
        };
        // SAFETY: the reference is only valid until the arena's node vector
        // is next mutated. The tree builder reads the name immediately and
        // never holds it across another sink call.
        unsafe { &*(name as *const QualName) }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> ArenaNodeId {
        self.dom
            .borrow_mut()
            .create_element(name, owned_attrs(attrs).collect())
    }

    fn create_comment(&self, text: StrTendril) -> ArenaNodeId {
        self.dom.borrow_mut().create_comment(text.to_string())
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> ArenaNodeId {
        self.dom.borrow_mut().create_comment(String::new())
    }

    fn append(&self, parent: &ArenaNodeId, child: NodeOrText<ArenaNodeId>) {
        self.place(Slot::LastChildOf(*parent), child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &ArenaNodeId,
        prev_element: &ArenaNodeId,
        child: NodeOrText<ArenaNodeId>,
    ) {
        match self.parent_of(*element) {
            Some(_) => self.place(Slot::Before(*element), child),
            None => self.place(Slot::LastChildOf(*prev_element), child),
        }
    }

    fn append_doctype_to_document(&self, _: StrTendril, _: StrTendril, _: StrTendril) {}

    fn get_template_contents(&self, target: &ArenaNodeId) -> ArenaNodeId {
        *target
    }

    fn same_node(&self, x: &ArenaNodeId, y: &ArenaNodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &ArenaNodeId, new_node: NodeOrText<ArenaNodeId>) {
        self.place(Slot::Before(*sibling), new_node);
    }

    fn add_attrs_if_missing(&self, target: &ArenaNodeId, attrs: Vec<ParsedAttribute>) {
        let mut dom = self.dom.borrow_mut();
        let Some(ArenaNodeData::Element { attrs: present, .. }) =
            dom.get_mut(*target).map(|n| &mut n.data)
        else {
            return;
        };
        for attr in owned_attrs(attrs) {
            if present.iter().all(|a| a.name != attr.name) {
                present.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &ArenaNodeId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &ArenaNodeId, new_parent: &ArenaNodeId) {
        let mut dom = self.dom.borrow_mut();
        let moved: Vec<ArenaNodeId> = dom.children(*node).collect();
        for child in moved {
            dom.detach(child);
            dom.append(*new_parent, child);
        }
    }
}
