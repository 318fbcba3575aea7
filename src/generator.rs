//! Bill of materials and pick and place files for assembly houses.

use std::{
    fmt::Display,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

use crate::{error::OutputError, Component, Design, Point, Rect};

/// Assembly house whose file formats to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Manufacturer {
    #[default]
    Pcbpool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown manufacturer `{0}`")]
pub struct UnknownManufacturer(pub String);

impl FromStr for Manufacturer {
    type Err = UnknownManufacturer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pcbpool") {
            Ok(Manufacturer::Pcbpool)
        } else {
            Err(UnknownManufacturer(s.to_owned()))
        }
    }
}

impl Display for Manufacturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Manufacturer::Pcbpool => write!(f, "pcbpool"),
        }
    }
}

/// One BOM row: every placed component sharing a description
#[derive(Debug, Clone, PartialEq)]
pub struct BomLine<'a> {
    /// In board file order
    pub references: Vec<&'a str>,
    /// The last component of the group, whose fields stand for the whole row
    pub component: &'a Component,
}

impl BomLine<'_> {
    pub fn quantity(&self) -> usize {
        self.references.len()
    }

    /// Value to print; connectors are listed without one
    pub fn value(&self) -> &str {
        if self.component.reference.starts_with('J') {
            ""
        } else {
            &self.component.value
        }
    }
}

/// Group the placed components of `design` by description.
///
/// Rows follow the order of `design.descriptions`. Descriptions without any
/// placed component get no row.
pub fn bom_lines(design: &Design) -> Vec<BomLine<'_>> {
    let mut lines = Vec::new();
    for description in &design.descriptions {
        let mut references = Vec::new();
        let mut representative = None;
        for component in design
            .placed_components()
            .filter(|c| &c.description == description)
        {
            references.push(component.reference.as_str());
            representative = Some(component);
        }
        match representative {
            Some(component) => lines.push(BomLine {
                references,
                component,
            }),
            None => log::warn!("No placed component has description {description:?}"),
        }
    }
    lines
}

const PCBPOOL_BOM_HEADER: &str = "Part;Value;Device;Package;Description;Description2;Quantity;\
    Place;Provided;Distributor;Distributor Part Number;Distributor Link;Remarks;Unit Price;\
    Total Price;Remarks Beta;Option1;Option2;Option3";

/// Writes manufacturing files for one [`Manufacturer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Generator {
    manufacturer: Manufacturer,
}

impl Generator {
    pub fn new(manufacturer: Manufacturer) -> Self {
        Self { manufacturer }
    }

    pub fn bom_file_name(&self, design: &Design) -> String {
        match self.manufacturer {
            Manufacturer::Pcbpool => format!("{}.bom.csv", design.name),
        }
    }

    pub fn pickplace_file_name(&self, design: &Design) -> String {
        match self.manufacturer {
            Manufacturer::Pcbpool => format!("{}.pickplace.txt", design.name),
        }
    }

    /// Write the bill of materials into `output_dir`, returning the file path.
    pub fn process_bom(
        &self,
        output_dir: impl AsRef<Path>,
        design: &Design,
    ) -> Result<PathBuf, OutputError> {
        let path = create(output_dir.as_ref(), &self.bom_file_name(design))?;
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_bom(design, &mut writer)?;
        writer.flush()?;
        Ok(path)
    }

    /// Write the pick and place file into `output_dir`, returning the file path.
    pub fn process_pickplace(
        &self,
        output_dir: impl AsRef<Path>,
        design: &Design,
    ) -> Result<PathBuf, OutputError> {
        let path = create(output_dir.as_ref(), &self.pickplace_file_name(design))?;
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_pickplace(design, &mut writer)?;
        writer.flush()?;
        Ok(path)
    }

    pub fn write_bom<W: Write>(&self, design: &Design, writer: W) -> Result<(), OutputError> {
        match self.manufacturer {
            Manufacturer::Pcbpool => write_bom_pcbpool(design, writer),
        }
    }

    pub fn write_pickplace<W: Write>(&self, design: &Design, writer: W) -> Result<(), OutputError> {
        match self.manufacturer {
            Manufacturer::Pcbpool => write_pickplace_pcbpool(design, writer),
        }
    }
}

fn create(output_dir: &Path, file_name: &str) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(output_dir)?;
    log::info!("   Writing to {}", output_dir.display());
    Ok(output_dir.join(file_name))
}

fn pcbpool_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn write_bom_pcbpool<W: Write>(design: &Design, mut writer: W) -> Result<(), OutputError> {
    writeln!(writer, "{PCBPOOL_BOM_HEADER}")?;
    for line in bom_lines(design) {
        let component = line.component;
        writeln!(
            writer,
            "{};{};{};{};{};;{};{};No;{};{};{};{};;;;;;",
            line.references.join(", "),
            line.value(),
            component.device,
            component.package,
            component.description,
            line.quantity(),
            pcbpool_bool(component.place),
            component.distributor.name,
            component.distributor.part_number,
            component.distributor.link,
            component.distributor.remark,
        )?;
    }
    Ok(())
}

/// Board position relative to the lower left corner of the outline, y up
fn relative_to_outline(outline: &Rect, point: Point) -> Point {
    Point {
        x: point.x - outline.left,
        y: outline.bottom - point.y,
    }
}

fn write_pickplace_pcbpool<W: Write>(design: &Design, mut writer: W) -> Result<(), OutputError> {
    let outline = design
        .outline
        .ok_or_else(|| OutputError::MissingOutline(design.name.clone()))?;

    writeln!(writer, "Filename:\t{}.pickplace.txt\n", design.name)?;
    writeln!(writer, "Position of PCB:\nleft under edge: X=0 / Y=0\n\n")?;
    writeln!(writer, "name\tX-axis\tY-axis\tangle\tvalue\tpackage\tside\n")?;

    for fiducial in &design.fiducials {
        let position = relative_to_outline(&outline, fiducial.position);
        writeln!(
            writer,
            "{}\t{:.2}\t{:.2}\t0.00\t1mm\tCircle\t{}",
            fiducial.reference, position.x, position.y, fiducial.side
        )?;
    }

    writeln!(writer)?;

    for component in design.components.values() {
        let Some(side) = component.side else {
            log::warn!("Leaving unplaced {} out of the pick and place file", component.reference);
            continue;
        };
        let position = relative_to_outline(&outline, component.position);
        writeln!(
            writer,
            "{}\t{:.2}\t{:.2}\t{:.2}\t{}\t{}\t{}",
            component.reference,
            position.x,
            position.y,
            component.rotation,
            component.value,
            component.package,
            side
        )?;
    }
    Ok(())
}
