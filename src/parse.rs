use std::collections::{BTreeMap, BTreeSet};

use crate::{raw, Component, Design, Fiducial, ParseError, Rect, Side};

/// Reference text of a fiducial footprint
const FIDUCIAL_PLACEHOLDER: &str = "REF**";
/// Reference text of logos and other fabrication markers
const MARKER_PLACEHOLDER: &str = "G***";

impl From<raw::NetComponent<'_>> for Component {
    fn from(value: raw::NetComponent<'_>) -> Self {
        let raw::NetComponent {
            ref_des,
            value,
            fields,
        } = value;

        let mut component = Component {
            reference: ref_des.to_owned(),
            value: value.to_owned(),
            ..Component::default()
        };
        for (name, value) in fields {
            let value = value.to_owned();
            match name {
                "Device" => component.device = value,
                "Package" => component.package = value,
                "Description" => component.description = value,
                "Place" => component.place = value.eq_ignore_ascii_case("YES"),
                "Dist" => component.distributor.name = value,
                "DistPartNumber" => component.distributor.part_number = value,
                "DiskLink" | "DistLink" => component.distributor.link = value,
                "Remark" => component.distributor.remark = value,
                _ => {}
            }
        }
        component
    }
}

/// Two-phase construction of a [`Design`].
///
/// The net file registers every component; the pcb file may then only place
/// components that were registered.
#[derive(Debug)]
pub(crate) struct DesignBuilder {
    name: String,
    date: String,
    components: BTreeMap<String, Component>,
    descriptions: BTreeSet<String>,
}

impl DesignBuilder {
    pub(crate) fn from_net(name: &str, net: raw::NetFile<'_>) -> Self {
        let mut components = BTreeMap::new();
        let mut descriptions = BTreeSet::new();
        for component in net.components {
            let component = Component::from(component);
            descriptions.insert(component.description.clone());
            if let Some(previous) = components.insert(component.reference.clone(), component) {
                log::warn!(
                    "Component {} is declared twice in the net file",
                    previous.reference
                );
            }
        }

        DesignBuilder {
            name: name.to_owned(),
            date: net.date.to_owned(),
            components,
            descriptions,
        }
    }

    pub(crate) fn place(self, pcb: raw::PcbFile<'_>) -> Result<Design, ParseError> {
        let DesignBuilder {
            name,
            date,
            mut components,
            descriptions,
        } = self;

        let mut fiducials = Vec::new();
        let mut references = Vec::new();
        let mut outline: Option<Rect> = None;
        let (mut top_fiducials, mut bottom_fiducials) = (0usize, 0usize);

        let raw::PcbFile { key: root_key, items } = pcb;
        for item in items {
            match item {
                raw::PcbItem::Module(module) if module.reference == FIDUCIAL_PLACEHOLDER => {
                    let side = Side::from_layer(module.layer);
                    let index = match side {
                        Side::Top => &mut top_fiducials,
                        Side::Bottom => &mut bottom_fiducials,
                    };
                    *index += 1;
                    let fiducial = Fiducial {
                        reference: format!("REF{}{}", index, side.suffix()),
                        position: module.position,
                        side,
                    };
                    log::debug!("Fiducial {} at {}", fiducial.reference, fiducial.position);
                    fiducials.push(fiducial);
                }
                raw::PcbItem::Module(module) if module.reference == MARKER_PLACEHOLDER => {
                    log::debug!("Skipping marker at {}", module.position);
                }
                raw::PcbItem::Module(module) => {
                    let component = components.get_mut(module.reference).ok_or_else(|| {
                        ParseError::UnknownReference {
                            reference: module.reference.to_owned(),
                            context: format!("{root_key}/{}", module.key),
                        }
                    })?;
                    component.position = module.position;
                    component.rotation = module.rotation;
                    component.side = Some(Side::from_layer(module.layer));
                    references.push(module.reference.to_owned());
                }
                raw::PcbItem::EdgeLine(line) => {
                    let rect = outline.get_or_insert_with(|| Rect::from_point(line.start));
                    rect.extend(line.start);
                    rect.extend(line.end);
                }
            }
        }

        for component in components.values().filter(|c| c.side.is_none()) {
            log::warn!("Component {} has no footprint on the board", component.reference);
        }
        if outline.is_none() {
            log::warn!("Board has no Edge.Cuts outline");
        }

        Ok(Design {
            name,
            date,
            outline,
            components,
            fiducials,
            references,
            descriptions,
        })
    }
}
