//! Read a KiCad net file and board file into one [`Design`] and write the
//! files an assembly house needs from it.
//!
//! ```no_run
//! use kicad_fab::{generator::Generator, Manufacturer};
//!
//! let design = kicad_fab::read_design_files("demo.net", "demo/demo.kicad_pcb")?;
//! Generator::new(Manufacturer::Pcbpool).process_bom("out", &design)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    fs,
    path::Path,
};

mod error;
pub mod generator;
mod parse;
pub mod raw;
pub mod sexpr;

pub use error::{DesignError, OutputError, ParseError, SourceFile};
pub use generator::Manufacturer;
pub use sexpr::SExpr;

/// Layer whose reference text marks a footprint as sitting on the top side
const TOP_SILKSCREEN: &str = "F.SilkS";

/// A point in board units (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis aligned rectangle, y grows downwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn from_point(point: Point) -> Self {
        Rect {
            left: point.x,
            top: point.y,
            right: point.x,
            bottom: point.y,
        }
    }

    /// Grow the rectangle until it contains `point`
    pub fn extend(&mut self, point: Point) {
        self.left = self.left.min(point.x);
        self.right = self.right.max(point.x);
        self.top = self.top.min(point.y);
        self.bottom = self.bottom.max(point.y);
    }
}

/// Board side a part is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    /// Side of a footprint whose reference text is on `layer`
    pub fn from_layer(layer: &str) -> Self {
        if layer == TOP_SILKSCREEN {
            Side::Top
        } else {
            Side::Bottom
        }
    }

    /// Letter closing a fiducial reference, as in `REF1T`
    pub fn suffix(&self) -> char {
        match self {
            Side::Top => 'T',
            Side::Bottom => 'B',
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Top => write!(f, "top"),
            Side::Bottom => write!(f, "bottom"),
        }
    }
}

/// Where to buy a part
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distributor {
    pub name: String,
    pub part_number: String,
    pub link: String,
    pub remark: String,
}

/// A part of the design
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub reference: String,
    pub value: String,
    pub position: Point,
    /// Degrees
    pub rotation: f64,
    /// `None` when the board has no footprint for the part
    pub side: Option<Side>,
    pub device: String,
    pub package: String,
    pub description: String,
    /// Whether the assembler should mount the part
    pub place: bool,
    pub distributor: Distributor,
}

impl Default for Component {
    fn default() -> Self {
        Component {
            reference: String::new(),
            value: String::new(),
            position: Point::default(),
            rotation: 0.0,
            side: None,
            device: String::new(),
            package: String::new(),
            description: String::new(),
            place: true,
            distributor: Distributor::default(),
        }
    }
}

/// An optical alignment mark
#[derive(Debug, Clone, PartialEq)]
pub struct Fiducial {
    /// `REF<n>T` or `REF<n>B`, numbered per side in board order
    pub reference: String,
    pub position: Point,
    pub side: Side,
}

/// A board with its parts, as read from the net and pcb files
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub name: String,
    pub date: String,
    /// Bounding box of the Edge.Cuts lines
    pub outline: Option<Rect>,
    pub components: BTreeMap<String, Component>,
    pub fiducials: Vec<Fiducial>,
    /// Placed parts in board file order
    pub references: Vec<String>,
    pub descriptions: BTreeSet<String>,
}

impl Design {
    /// Components that have a footprint on the board, in board file order
    pub fn placed_components(&self) -> impl Iterator<Item = &Component> {
        self.references
            .iter()
            .filter_map(|reference| self.components.get(reference))
    }
}

fn in_file(file: SourceFile) -> impl Fn(ParseError) -> DesignError {
    move |source| DesignError::Parse { file, source }
}

/// Build a design from the text of a net file and a pcb file.
pub fn read_design(name: &str, net: &str, pcb: &str) -> Result<Design, DesignError> {
    let net_root = SExpr::try_from(net).map_err(in_file(SourceFile::Net))?;
    let net = raw::NetFile::try_from(&net_root).map_err(in_file(SourceFile::Net))?;
    let builder = parse::DesignBuilder::from_net(name, net);

    let pcb_root = SExpr::try_from(pcb).map_err(in_file(SourceFile::Pcb))?;
    let pcb = raw::PcbFile::try_from(&pcb_root).map_err(in_file(SourceFile::Pcb))?;
    builder.place(pcb).map_err(in_file(SourceFile::Pcb))
}

/// Read a design from disk, naming it after the directory holding the pcb file.
pub fn read_design_files(
    net_path: impl AsRef<Path>,
    pcb_path: impl AsRef<Path>,
) -> Result<Design, DesignError> {
    let (net_path, pcb_path) = (net_path.as_ref(), pcb_path.as_ref());
    let read = |path: &Path| {
        log::info!("   Reading {}", path.display());
        fs::read_to_string(path).map_err(|source| DesignError::Io {
            path: path.to_owned(),
            source,
        })
    };
    let net = read(net_path)?;
    let pcb = read(pcb_path)?;
    read_design(&project_name(pcb_path), &net, &pcb)
}

/// Name of the directory containing `pcb_path`, or the file stem if there is none.
pub fn project_name(pcb_path: &Path) -> String {
    std::path::absolute(pcb_path)
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .or_else(|| pcb_path.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
