/// Element lookup by local name, ignoring namespaces. The first match wins.
pub(crate) trait Element: Sized {
    fn local_name(&self) -> &str;
    fn child_elements(&self) -> impl Iterator<Item = Self>;
    fn attribute_value(&self, name: &str) -> Option<&str>;
    fn text_content(&self) -> String;

    fn child(&self, name: &str) -> Option<Self> {
        self.child_elements().find(|element| element.local_name() == name)
    }

    fn children_named(&self, name: &str) -> impl Iterator<Item = Self> {
        self.child_elements().filter(move |element| element.local_name() == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|element| element.text_content())
    }
}

impl<'a, 'input: 'a> Element for roxmltree::Node<'a, 'input> {
    fn local_name(&self) -> &str {
        self.tag_name().name()
    }

    fn child_elements(&self) -> impl Iterator<Item = Self> {
        self.children().filter(|node| node.is_element())
    }

    fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes()
            .find(|attribute| attribute.name() == name)
            .map(|attribute| attribute.value())
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect()
    }
}
