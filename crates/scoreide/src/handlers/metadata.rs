//! Metadata editing, saved views, and segment numbering.

use std::path::Path;

use crate::classify::Roots;
use crate::controller::Ide;
use crate::error::{IdeError, Result};
use crate::getter::{self, Getter};
use crate::io::Interaction;
use crate::listing;
use crate::metadata::{self, Metadata, display_value, keys};
use crate::view::ViewInventory;

pub(crate) fn show(ide: &mut Ide) -> Result<()> {
    let metadata = Metadata::load(ide.current_directory())?;
    if metadata.is_empty() {
        return ide.display(&["No metadata.".to_string()]);
    }
    let lines: Vec<String> = metadata
        .iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect();
    ide.display(&lines)
}

pub(crate) fn edit_title(ide: &mut Ide) -> Result<()> {
    let Some(answer) = Getter::new().text("New title").run_one(ide)? else {
        return Ok(());
    };
    if let Some(title) = answer.text() {
        metadata::set(ide.current_directory(), keys::TITLE, title)?;
        ide.session_mut().request_menu_rebuild();
    }
    Ok(())
}

pub(crate) fn edit_year(ide: &mut Ide) -> Result<()> {
    let Some(answer) = Getter::new().integer("New year", 0, 9999).run_one(ide)? else {
        return Ok(());
    };
    if let Some(year) = answer.integer() {
        metadata::set(ide.current_directory(), keys::YEAR, year)?;
        ide.session_mut().request_menu_rebuild();
    }
    Ok(())
}

// ── Views ────────────────────────────────────────────────────────────

pub(crate) fn list_views(ide: &mut Ide) -> Result<()> {
    let directory = ide.current_directory().to_path_buf();
    let inventory = ViewInventory::load(&directory)?;
    let names = inventory.names();
    if names.is_empty() {
        return ide.display(&["No views.".to_string()]);
    }
    let selected = Metadata::load(&directory)?
        .get_str(keys::VIEW_NAME)
        .map(str::to_string);
    let lines: Vec<String> = names
        .iter()
        .map(|name| {
            let patterns = inventory.patterns(name).unwrap_or_default().join("; ");
            let marker = if selected.as_deref() == Some(name.as_str()) {
                " (selected)"
            } else {
                ""
            };
            format!("{}: {}{}", name, patterns, marker)
        })
        .collect();
    ide.display(&lines)
}

pub(crate) fn new_view(ide: &mut Ide) -> Result<()> {
    let Some(answers) = Getter::new()
        .text("View name")
        .text("View patterns")
        .run(ide)?
    else {
        return Ok(());
    };
    let (Some(name), Some(patterns)) = (answers[0].text(), answers[1].text()) else {
        return Ok(());
    };
    let patterns: Vec<String> = patterns
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let directory = ide.current_directory().to_path_buf();
    let mut inventory = ViewInventory::load(&directory)?;
    match inventory.insert(name, patterns) {
        Ok(()) => {
            inventory.save(&directory)?;
            ide.display(&[format!("Saved view {:?}.", name)])
        }
        Err(e @ IdeError::InvalidView(_)) => ide.display(&[e.to_string()]),
        Err(e) => Err(e),
    }
}

pub(crate) fn set_view(ide: &mut Ide) -> Result<()> {
    let directory = ide.current_directory().to_path_buf();
    let names = ViewInventory::load(&directory)?.names();
    if names.is_empty() {
        return ide.display(&["No views.".to_string()]);
    }
    let Some(index) = getter::select(ide, "View", &names)? else {
        return Ok(());
    };
    metadata::set(&directory, keys::VIEW_NAME, names[index].as_str())?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

pub(crate) fn clear_view(ide: &mut Ide) -> Result<()> {
    metadata::remove(ide.current_directory(), keys::VIEW_NAME)?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

// ── Segments ─────────────────────────────────────────────────────────

/// Number the visible segments of `directory` in listing order and derive
/// each one's first bar from the measure counts before it.
pub(crate) fn renumber(directory: &Path, roots: &Roots) -> Result<usize> {
    let segments = listing::visible_directories(directory, roots)?;
    let count = segments.len();
    let mut first_bar = 1;
    for (index, segment) in segments.iter().enumerate() {
        let mut metadata = Metadata::load(segment)?;
        metadata.set(keys::SEGMENT_NUMBER, index as i64 + 1);
        metadata.set(keys::SEGMENT_COUNT, count as i64);
        metadata.set(keys::FIRST_BAR_NUMBER, first_bar);
        first_bar += metadata.get_i64(keys::MEASURE_COUNT).unwrap_or(0);
        metadata.save(segment)?;
    }
    log::debug!("renumbered {} segments in {}", count, directory.display());
    Ok(count)
}

pub(crate) fn renumber_segments(ide: &mut Ide) -> Result<()> {
    let count = renumber(ide.current_directory(), ide.roots())?;
    ide.session_mut().request_menu_rebuild();
    ide.display(&[format!("Renumbered {} segments.", count)])
}
