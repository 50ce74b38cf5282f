use std::path::Path;

/// One logical component of a save profile. Each component lives in its
/// own file with a fixed stem; the `.json` extension is historical, the
/// content is the binary container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveComponent {
    pub stem: &'static str,
    pub label: &'static str,
}

/// The component files a save profile directory is known to contain.
pub const SAVE_COMPONENTS: &[SaveComponent] = &[
    SaveComponent { stem: "persist.game", label: "session settings" },
    SaveComponent { stem: "persist.estate", label: "estate metadata" },
    SaveComponent { stem: "persist.roster", label: "hero roster" },
    SaveComponent { stem: "persist.wallet", label: "wallet and currency" },
    SaveComponent { stem: "persist.town", label: "town state" },
    SaveComponent { stem: "persist.quest", label: "quest state" },
    SaveComponent { stem: "persist.progression", label: "campaign progression" },
    SaveComponent { stem: "persist.upgrades", label: "building upgrades" },
    SaveComponent { stem: "persist.journal", label: "journal pages" },
    SaveComponent { stem: "persist.tutorial", label: "tutorial flags" },
];

/// Match a path against the known save-component stems.
pub fn component_for_path(path: &Path) -> Option<SaveComponent> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(".json")?;
    SAVE_COMPONENTS.iter().copied().find(|c| c.stem == stem)
}

/// Whether a file name follows the save-component naming convention.
pub fn is_save_file(path: &Path) -> bool {
    component_for_path(path).is_some()
}
