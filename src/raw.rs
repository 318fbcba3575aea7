use crate::Point;

mod parser;

/// The parts of a net file the design needs
#[derive(Debug, Clone, PartialEq)]
pub struct NetFile<'a> {
    pub date: &'a str,
    pub components: Vec<NetComponent<'a>>,
}

/// A component declared in the net file
#[derive(Debug, Clone, PartialEq)]
pub struct NetComponent<'a> {
    pub ref_des: &'a str,
    pub value: &'a str,
    /// User fields as `(name, value)` pairs in file order
    pub fields: Vec<(&'a str, &'a str)>,
}

/// The top-level items of a pcb file that matter for assembly, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct PcbFile<'a> {
    /// Key of the root node
    pub key: &'a str,
    pub items: Vec<PcbItem<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PcbItem<'a> {
    Module(Module<'a>),
    /// A line on the Edge.Cuts layer
    EdgeLine(EdgeLine),
}

/// A placed footprint
#[derive(Debug, Clone, PartialEq)]
pub struct Module<'a> {
    /// `module` or `footprint`
    pub key: &'a str,
    /// Text of the reference field, including placeholders like `REF**`
    pub reference: &'a str,
    /// Layer of the reference field
    pub layer: &'a str,
    pub position: Point,
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLine {
    pub start: Point,
    pub end: Point,
}
