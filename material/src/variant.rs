//! Feature variants and the rules deciding which ones a material needs.
//!
//! A variant key is an 8-bit mask of orthogonal rendering features. Each
//! generated program is identified by a `(stage, key)` pair; stages only see
//! the bits they depend on, so one vertex program can serve several fragment
//! variants.

use bitflags::bitflags;

use crate::types::{ShaderStage, UserVariantFilter};

bitflags! {
    /// Rendering features a program is specialised for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct VariantKey: u8 {
        const DIRECTIONAL_LIGHTING = 0x01;
        const DYNAMIC_LIGHTING = 0x02;
        const SHADOW_RECEIVER = 0x04;
        const SKINNING = 0x08;
        const DEPTH = 0x10;
        const FOG = 0x20;
        const PICKING = 0x40;
        const VSM = 0x80;
    }
}

impl VariantKey {
    /// Number of raw keys.
    pub const COUNT: usize = 256;

    /// Bits the vertex stage depends on.
    pub const VERTEX_MASK: Self = Self::DIRECTIONAL_LIGHTING
        .union(Self::SHADOW_RECEIVER)
        .union(Self::SKINNING)
        .union(Self::DEPTH)
        .union(Self::VSM);

    /// Bits the fragment stage depends on.
    pub const FRAGMENT_MASK: Self = Self::all().difference(Self::SKINNING);

    const LIGHTING: Self = Self::DIRECTIONAL_LIGHTING.union(Self::DYNAMIC_LIGHTING);

    /// Key `0` used for post-process opaque programs.
    pub const POST_PROCESS_OPAQUE: Self = Self::empty();
    /// Key `1` used for post-process translucent programs.
    pub const POST_PROCESS_TRANSLUCENT: Self = Self::DIRECTIONAL_LIGHTING;

    pub fn is_depth(self) -> bool {
        self.contains(Self::DEPTH)
    }

    /// A depth-only variant: no lighting, shadow receiving or fog, and at most
    /// one of picking or VSM.
    pub fn is_valid_depth_variant(self) -> bool {
        self.is_depth()
            && !self.intersects(Self::LIGHTING | Self::SHADOW_RECEIVER | Self::FOG)
            && !self.contains(Self::PICKING | Self::VSM)
    }

    /// A color variant: no picking, and VSM only when receiving shadows.
    pub fn is_valid_standard_variant(self) -> bool {
        !self.is_depth()
            && !self.contains(Self::PICKING)
            && (!self.contains(Self::VSM) || self.contains(Self::SHADOW_RECEIVER))
    }

    /// Keys that are neither valid depth nor valid standard variants.
    pub fn is_reserved(self) -> bool {
        !self.is_valid_depth_variant() && !self.is_valid_standard_variant()
    }

    /// The part of the key a given stage depends on.
    pub fn for_stage(self, stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => self & Self::VERTEX_MASK,
            ShaderStage::Fragment => self & Self::FRAGMENT_MASK,
        }
    }

    /// Removes features the user filtered out.
    pub fn filter_user(self, filter: UserVariantFilter) -> Self {
        let mut key = self;
        for (user, bits) in [
            (
                UserVariantFilter::DIRECTIONAL_LIGHTING,
                Self::DIRECTIONAL_LIGHTING,
            ),
            (UserVariantFilter::DYNAMIC_LIGHTING, Self::DYNAMIC_LIGHTING),
            (UserVariantFilter::SHADOW_RECEIVER, Self::SHADOW_RECEIVER),
            (UserVariantFilter::SKINNING, Self::SKINNING),
            (UserVariantFilter::FOG, Self::FOG),
            (UserVariantFilter::VSM, Self::VSM),
        ] {
            if filter.contains(user) {
                key.remove(bits);
            }
        }
        key
    }

    /// Removes features an unlit material cannot use. Shadow receiving is kept
    /// only when the material applies a shadow multiplier.
    pub fn filter_lighting(self, is_lit: bool, shadow_multiplier: bool) -> Self {
        if is_lit {
            return self;
        }
        let mut key = self - Self::LIGHTING;
        if !shadow_multiplier {
            key.remove(Self::SHADOW_RECEIVER | Self::VSM);
        }
        key
    }
}

/// One program to generate: a stage specialised for a variant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    pub key: VariantKey,
    pub stage: ShaderStage,
}

impl Variant {
    pub fn new(key: VariantKey, stage: ShaderStage) -> Self {
        Self { key, stage }
    }
}

/// Variants of a surface material, ordered by key then stage.
pub fn surface_variants(
    filter: UserVariantFilter,
    is_lit: bool,
    shadow_multiplier: bool,
) -> Vec<Variant> {
    let mut variants = Vec::new();
    for raw in 0..VariantKey::COUNT {
        let key = VariantKey::from_bits_retain(raw as u8);
        if key.is_reserved() {
            continue;
        }
        let filtered = key
            .filter_user(filter)
            .filter_lighting(is_lit, shadow_multiplier);
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if filtered.for_stage(stage) == key {
                variants.push(Variant::new(key, stage));
            }
        }
    }
    variants
}

/// Variants of a post-process material.
pub fn post_process_variants() -> Vec<Variant> {
    let mut variants = Vec::with_capacity(4);
    for key in [
        VariantKey::POST_PROCESS_OPAQUE,
        VariantKey::POST_PROCESS_TRANSLUCENT,
    ] {
        variants.push(Variant::new(key, ShaderStage::Vertex));
        variants.push(Variant::new(key, ShaderStage::Fragment));
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_variant_rules() {
        assert!(VariantKey::DEPTH.is_valid_depth_variant());
        assert!((VariantKey::DEPTH | VariantKey::SKINNING).is_valid_depth_variant());
        assert!((VariantKey::DEPTH | VariantKey::PICKING).is_valid_depth_variant());
        assert!(!(VariantKey::DEPTH | VariantKey::FOG).is_valid_depth_variant());
        assert!(
            !(VariantKey::DEPTH | VariantKey::PICKING | VariantKey::VSM).is_valid_depth_variant()
        );
    }

    #[test]
    fn standard_variant_rules() {
        assert!(VariantKey::empty().is_valid_standard_variant());
        assert!(!VariantKey::PICKING.is_valid_standard_variant());
        assert!(!VariantKey::VSM.is_valid_standard_variant());
        assert!((VariantKey::VSM | VariantKey::SHADOW_RECEIVER).is_valid_standard_variant());
    }

    #[test]
    fn stage_masks() {
        let key = VariantKey::all();
        assert!(!key.for_stage(ShaderStage::Vertex).contains(VariantKey::FOG));
        assert!(key.for_stage(ShaderStage::Vertex).contains(VariantKey::SKINNING));
        assert!(!key.for_stage(ShaderStage::Fragment).contains(VariantKey::SKINNING));
    }

    #[test]
    fn surface_variants_are_sorted_and_stage_filtered() {
        let variants = surface_variants(UserVariantFilter::empty(), true, false);
        assert!(!variants.is_empty());
        for pair in variants.windows(2) {
            assert!((pair[0].key, pair[0].stage) < (pair[1].key, pair[1].stage));
        }
        for v in &variants {
            assert_eq!(v.key.for_stage(v.stage), v.key);
            assert!(!v.key.is_reserved());
        }
        assert!(variants.contains(&Variant::new(VariantKey::empty(), ShaderStage::Vertex)));
        assert!(variants.contains(&Variant::new(VariantKey::FOG, ShaderStage::Fragment)));
        assert!(!variants.contains(&Variant::new(VariantKey::FOG, ShaderStage::Vertex)));
    }

    #[test]
    fn unlit_materials_drop_lighting() {
        let variants = surface_variants(UserVariantFilter::empty(), false, false);
        assert!(variants.iter().all(|v| !v.key.intersects(
            VariantKey::DIRECTIONAL_LIGHTING
                | VariantKey::DYNAMIC_LIGHTING
                | VariantKey::SHADOW_RECEIVER
        )));
    }

    #[test]
    fn unlit_with_shadow_multiplier_keeps_shadow_receiver() {
        let variants = surface_variants(UserVariantFilter::empty(), false, true);
        assert!(variants.iter().any(|v| v.key.contains(VariantKey::SHADOW_RECEIVER)));
        assert!(variants.iter().all(|v| !v.key.contains(VariantKey::DYNAMIC_LIGHTING)));
    }

    #[test]
    fn user_filter_removes_features() {
        let filter = UserVariantFilter::FOG | UserVariantFilter::SKINNING;
        let variants = surface_variants(filter, true, false);
        assert!(variants.iter().all(|v| !v.key.intersects(VariantKey::FOG | VariantKey::SKINNING)));
        let unfiltered = surface_variants(UserVariantFilter::empty(), true, false);
        assert!(variants.len() < unfiltered.len());
    }

    #[test]
    fn post_process_has_two_keys_per_stage() {
        let variants = post_process_variants();
        assert_eq!(variants.len(), 4);
        assert_eq!(variants[0], Variant::new(VariantKey::empty(), ShaderStage::Vertex));
        assert_eq!(variants[3].key.bits(), 1);
    }
}
