//! ICDAR table ground-truth parsing
//!
//! Reads the cTDaR XML layout:
//!
//! ```xml
//! <document filename="cTDaR_t10001.jpg">
//!   <table id="Table_1">
//!     <Coords points="10,20 300,20 300,400 10,400"/>
//!     <cell id="TableCell_1" start-row="0" end-row="0" start-col="0" end-col="1">
//!       <Coords points="10,20 150,20 150,60 10,60"/>
//!     </cell>
//!   </table>
//! </document>
//! ```

use roxmltree::Node;
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::{Cell, Document, GridPosition, Polygon, Table};

const TABLE_TAG: &str = "table";
const CELL_TAG: &str = "cell";
const COORDS_TAG: &str = "Coords";

/// Read and parse a single ground-truth XML file into a Document
pub fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    let content = std::str::from_utf8(&bytes)
        .map_err(|e| ConvertError::malformed(path, format!("not valid UTF-8: {}", e)))?;
    let fallback = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    parse_document(content, &fallback).map_err(|e| match e {
        // Attach the real path to errors raised on in-memory content
        ConvertError::MalformedAnnotation { message, .. } => ConvertError::malformed(path, message),
        other => other,
    })
}

/// Parse XML content. `fallback_filename` is used when the root element has no
/// `filename` attribute.
pub fn parse_document(xml: &str, fallback_filename: &str) -> Result<Document> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ConvertError::malformed(fallback_filename, e.to_string()))?;
    let root = doc.root_element();

    let filename = root
        .attribute("filename")
        .unwrap_or(fallback_filename)
        .to_string();

    let tables = root
        .children()
        .filter(|node| node.has_tag_name(TABLE_TAG))
        .map(|node| parse_table(node, fallback_filename))
        .collect::<Result<Vec<_>>>()?;

    Ok(Document { filename, tables })
}

/// Parse a `points` attribute such as `"10,20 30.5,40"` into a polygon.
pub fn parse_points(points: &str) -> std::result::Result<Polygon, String> {
    points
        .split_whitespace()
        .map(|token| -> std::result::Result<(f64, f64), String> {
            let (x, y) = token
                .split_once(',')
                .ok_or_else(|| format!("point '{}' is not of the form x,y", token))?;
            let x = parse_coordinate(x)
                .ok_or_else(|| format!("invalid x coordinate in point '{}'", token))?;
            let y = parse_coordinate(y)
                .ok_or_else(|| format!("invalid y coordinate in point '{}'", token))?;
            Ok((x, y))
        })
        .collect()
}

// NaN and infinities parse as f64 but are not pixel positions
fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_table(node: Node, source: &str) -> Result<Table> {
    let points = parse_coords(node, source)?;
    let cells = node
        .children()
        .filter(|child| child.has_tag_name(CELL_TAG))
        .map(|child| parse_cell(child, source))
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        id: node.attribute("id").map(str::to_string),
        points,
        cells,
    })
}

fn parse_cell(node: Node, source: &str) -> Result<Cell> {
    Ok(Cell {
        id: node.attribute("id").map(str::to_string),
        points: parse_coords(node, source)?,
        grid: parse_grid(node, source)?,
    })
}

// A missing Coords child or points attribute gives an empty polygon
fn parse_coords(node: Node, source: &str) -> Result<Polygon> {
    let points = node
        .children()
        .find(|child| child.has_tag_name(COORDS_TAG))
        .and_then(|coords| coords.attribute("points"));

    match points {
        Some(points) => parse_points(points).map_err(|message| {
            ConvertError::malformed(
                source,
                format!("line {}: {}", node_line(node), message),
            )
        }),
        None => Ok(Vec::new()),
    }
}

fn parse_grid(node: Node, source: &str) -> Result<Option<GridPosition>> {
    let mut values = [None; 4];
    for (slot, name) in values
        .iter_mut()
        .zip(["start-row", "end-row", "start-col", "end-col"])
    {
        if let Some(raw) = node.attribute(name) {
            let value = raw.trim().parse::<u32>().map_err(|_| {
                ConvertError::malformed(
                    source,
                    format!(
                        "line {}: attribute {}='{}' is not an integer",
                        node_line(node),
                        name,
                        raw
                    ),
                )
            })?;
            *slot = Some(value);
        }
    }

    match values {
        [Some(start_row), Some(end_row), Some(start_col), Some(end_col)] => {
            Ok(Some(GridPosition {
                start_row,
                end_row,
                start_col,
                end_col,
            }))
        }
        _ => Ok(None),
    }
}

fn node_line(node: Node) -> u32 {
    node.document().text_pos_at(node.range().start).row
}
