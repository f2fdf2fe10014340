//! Face images for the two paddles
//!
//! The host loads [`AVATAR_FILES`] in one parallel batch and reports which
//! ones succeeded. Failed images never become selectable; if none load at
//! all the paddles still get the hardcoded fallbacks so the game stays
//! playable.

use crate::sim::Side;

/// Images offered in the face menu, in display order
pub const AVATAR_FILES: [&str; 6] = [
    "assets/face_player.png",
    "assets/face_cpu.png",
    "assets/face_1.png",
    "assets/face_2.png",
    "assets/face_3.png",
    "assets/face_4.png",
];

pub const FALLBACK_PLAYER: &str = "assets/face_player.png";
pub const FALLBACK_COMPUTER: &str = "assets/face_cpu.png";

/// Outcome of loading one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarEntry {
    pub src: String,
    pub loaded: bool,
}

impl AvatarEntry {
    pub fn new(src: impl Into<String>, loaded: bool) -> Self {
        Self {
            src: src.into(),
            loaded,
        }
    }

    /// Label shown under the face button
    pub fn name(&self) -> &str {
        self.src.rsplit('/').next().unwrap_or(&self.src)
    }
}

/// Current face for each side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarSelection {
    pub player: String,
    pub computer: String,
}

impl AvatarSelection {
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Player => &self.player,
            Side::Computer => &self.computer,
        }
    }
}

/// Successfully loaded avatars
#[derive(Debug, Clone, Default)]
pub struct AvatarCatalog {
    entries: Vec<AvatarEntry>,
}

impl AvatarCatalog {
    /// Keep only the images that loaded, preserving order
    pub fn from_results(results: impl IntoIterator<Item = AvatarEntry>) -> Self {
        let entries: Vec<AvatarEntry> = results
            .into_iter()
            .filter(|entry| {
                if !entry.loaded {
                    log::warn!("Avatar failed to load: {}", entry.src);
                }
                entry.loaded
            })
            .collect();
        log::info!("{} avatar(s) available", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[AvatarEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries.iter().any(|e| e.src == src)
    }

    /// Player gets the first loaded face, the computer the second (or the first again)
    pub fn default_selection(&self) -> AvatarSelection {
        let first = self.entries.first().map(|e| e.src.as_str());
        let second = self.entries.get(1).map(|e| e.src.as_str());
        AvatarSelection {
            player: first.unwrap_or(FALLBACK_PLAYER).to_string(),
            computer: second.or(first).unwrap_or(FALLBACK_COMPUTER).to_string(),
        }
    }

    /// Assign `src` to `side` if it is in the catalog
    pub fn select(&self, selection: &mut AvatarSelection, side: Side, src: &str) -> bool {
        if !self.contains(src) {
            log::warn!("Ignoring unknown avatar {}", src);
            return false;
        }
        let slot = match side {
            Side::Player => &mut selection.player,
            Side::Computer => &mut selection.computer,
        };
        *slot = src.to_string();
        true
    }
}
