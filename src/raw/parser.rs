use crate::{error::ParseError, sexpr::SExpr, Point};

use super::{EdgeLine, Module, NetComponent, NetFile, PcbFile, PcbItem};

const EDGE_LAYER: &str = "Edge.Cuts";

fn key_of(node: &SExpr<'_>) -> String {
    node.key().unwrap_or_default().to_owned()
}

fn point(node: &SExpr<'_>) -> Result<Point, ParseError> {
    Ok(Point {
        x: node.number_at(1)?,
        y: node.number_at(2)?,
    })
}

impl<'a> TryFrom<&'a SExpr<'_>> for NetComponent<'a> {
    type Error = ParseError;

    fn try_from(node: &'a SExpr<'_>) -> Result<Self, Self::Error> {
        let ref_des = node.value("ref")?;
        let value = node.value("value")?;

        let mut fields = Vec::new();
        if let Some(list) = node.find("fields") {
            for field in list.items().iter().skip(1) {
                // (field (name Device) R_0603)
                let name = field
                    .get(1)
                    .and_then(|name| name.get(1))
                    .and_then(SExpr::text)
                    .ok_or_else(|| ParseError::MissingField {
                        key: "name".to_owned(),
                        context: format!("{}/fields/{}", key_of(node), key_of(field)),
                    })?;
                let value = field.get(2).and_then(SExpr::text).unwrap_or_default();
                fields.push((name, value));
            }
        }

        Ok(NetComponent {
            ref_des,
            value,
            fields,
        })
    }
}

impl<'a> TryFrom<&'a SExpr<'_>> for NetFile<'a> {
    type Error = ParseError;

    fn try_from(root: &'a SExpr<'_>) -> Result<Self, Self::Error> {
        let root_key = key_of(root);
        let date = root
            .child("design")?
            .value("date")
            .map_err(|e| e.within(&root_key))?;

        let components = root.child("components")?;
        let components = components
            .items()
            .iter()
            .skip(1)
            .map(|node| {
                if node.as_list().is_none() {
                    return Err(ParseError::UnexpectedNode {
                        expected: format!("a component list, found `{node}`"),
                        context: "components".to_owned(),
                    });
                }
                NetComponent::try_from(node).map_err(|e| e.within("components"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.within(&root_key))?;

        log::debug!("Net file declares {} components", components.len());
        Ok(NetFile { date, components })
    }
}

impl<'a> TryFrom<&'a SExpr<'_>> for Module<'a> {
    type Error = ParseError;

    fn try_from(node: &'a SExpr<'_>) -> Result<Self, Self::Error> {
        let at = node.child("at")?;
        let position = point(at).map_err(|e| e.within(&key_of(node)))?;
        let rotation = match at.get(3) {
            Some(_) => at.number_at(3).map_err(|e| e.within(&key_of(node)))?,
            None => 0.0,
        };

        let text = node
            .child_with("fp_text", "reference")
            .ok_or_else(|| ParseError::MissingField {
                key: "fp_text reference".to_owned(),
                context: key_of(node),
            })?;
        let reference = text
            .text_at(2)
            .map_err(|e| e.within(&key_of(node)))?;
        let layer = text
            .value("layer")
            .map_err(|e| e.within(&key_of(node)))?;

        Ok(Module {
            key: node.key().unwrap_or_default(),
            reference,
            layer,
            position,
            rotation,
        })
    }
}

impl TryFrom<&SExpr<'_>> for EdgeLine {
    type Error = ParseError;

    fn try_from(node: &SExpr<'_>) -> Result<Self, Self::Error> {
        let within = |e: ParseError| e.within(&key_of(node));
        let start = point(node.child("start")?).map_err(within)?;
        let end = point(node.child("end")?).map_err(within)?;
        Ok(EdgeLine { start, end })
    }
}

impl<'a> TryFrom<&'a SExpr<'_>> for PcbFile<'a> {
    type Error = ParseError;

    fn try_from(root: &'a SExpr<'_>) -> Result<Self, Self::Error> {
        let key = root.key().unwrap_or_default();
        let mut items = Vec::new();

        for node in root.items().iter().skip(1) {
            let item = match node.key() {
                // KiCad 6 renamed `module` to `footprint`
                Some("module") | Some("footprint") => PcbItem::Module(
                    Module::try_from(node).map_err(|e| e.within(key))?,
                ),
                Some("gr_line") if node.child_with("layer", EDGE_LAYER).is_some() => {
                    PcbItem::EdgeLine(EdgeLine::try_from(node).map_err(|e| e.within(key))?)
                }
                _ => continue,
            };
            items.push(item);
        }

        log::debug!("Pcb file has {} modules and edge lines", items.len());
        Ok(PcbFile { key, items })
    }
}
