use worldsim_common::EntityKind;

use crate::surface::Rgba;

/// Fill colors per entity kind.
///
/// `EntityKind::Other` has no color; such entities are not painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub human: Rgba,
    pub animal: Rgba,
    pub insect: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            human: Rgba::BLUE,
            animal: Rgba::GREEN,
            insect: Rgba::RED,
        }
    }
}

impl Palette {
    pub fn color_for(&self, kind: &EntityKind) -> Option<Rgba> {
        match kind {
            EntityKind::Human => Some(self.human),
            EntityKind::Animal => Some(self.animal),
            EntityKind::Insect => Some(self.insect),
            EntityKind::Other(_) => None,
        }
    }
}
