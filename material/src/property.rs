//! Material properties and the fixed-size set recording which ones a material writes.

/// A property of the `MaterialInputs` structure user code may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Property {
    BaseColor,
    Roughness,
    Metallic,
    Reflectance,
    AmbientOcclusion,
    ClearCoat,
    ClearCoatRoughness,
    ClearCoatNormal,
    Anisotropy,
    AnisotropyDirection,
    Thickness,
    SubsurfacePower,
    SubsurfaceColor,
    SheenColor,
    SheenRoughness,
    SpecularColor,
    Glossiness,
    Emissive,
    Normal,
    PostLightingColor,
    ClipSpaceTransform,
    Absorption,
    Transmission,
    Ior,
    MicroThickness,
    BentNormal,
    SpecularFactor,
    SpecularColorFactor,
}

static_assertions::const_assert!(Property::COUNT <= 64);

impl Property {
    pub const COUNT: usize = 28;

    pub const ALL: [Property; Property::COUNT] = [
        Property::BaseColor,
        Property::Roughness,
        Property::Metallic,
        Property::Reflectance,
        Property::AmbientOcclusion,
        Property::ClearCoat,
        Property::ClearCoatRoughness,
        Property::ClearCoatNormal,
        Property::Anisotropy,
        Property::AnisotropyDirection,
        Property::Thickness,
        Property::SubsurfacePower,
        Property::SubsurfaceColor,
        Property::SheenColor,
        Property::SheenRoughness,
        Property::SpecularColor,
        Property::Glossiness,
        Property::Emissive,
        Property::Normal,
        Property::PostLightingColor,
        Property::ClipSpaceTransform,
        Property::Absorption,
        Property::Transmission,
        Property::Ior,
        Property::MicroThickness,
        Property::BentNormal,
        Property::SpecularFactor,
        Property::SpecularColorFactor,
    ];

    /// Field name in `MaterialInputs` / `MaterialVertexInputs`.
    pub fn name(self) -> &'static str {
        match self {
            Self::BaseColor => "baseColor",
            Self::Roughness => "roughness",
            Self::Metallic => "metallic",
            Self::Reflectance => "reflectance",
            Self::AmbientOcclusion => "ambientOcclusion",
            Self::ClearCoat => "clearCoat",
            Self::ClearCoatRoughness => "clearCoatRoughness",
            Self::ClearCoatNormal => "clearCoatNormal",
            Self::Anisotropy => "anisotropy",
            Self::AnisotropyDirection => "anisotropyDirection",
            Self::Thickness => "thickness",
            Self::SubsurfacePower => "subsurfacePower",
            Self::SubsurfaceColor => "subsurfaceColor",
            Self::SheenColor => "sheenColor",
            Self::SheenRoughness => "sheenRoughness",
            Self::SpecularColor => "specularColor",
            Self::Glossiness => "glossiness",
            Self::Emissive => "emissive",
            Self::Normal => "normal",
            Self::PostLightingColor => "postLightingColor",
            Self::ClipSpaceTransform => "clipSpaceTransform",
            Self::Absorption => "absorption",
            Self::Transmission => "transmission",
            Self::Ior => "ior",
            Self::MicroThickness => "microThickness",
            Self::BentNormal => "bentNormal",
            Self::SpecularFactor => "specularFactor",
            Self::SpecularColorFactor => "specularColorFactor",
        }
    }

    /// GLSL type of the field.
    pub fn glsl_type(self) -> &'static str {
        match self {
            Self::BaseColor | Self::Emissive | Self::PostLightingColor => "vec4",
            Self::ClearCoatNormal
            | Self::AnisotropyDirection
            | Self::SubsurfaceColor
            | Self::SheenColor
            | Self::SpecularColor
            | Self::Normal
            | Self::Absorption
            | Self::BentNormal
            | Self::SpecularColorFactor => "vec3",
            Self::ClipSpaceTransform => "mat4",
            _ => "float",
        }
    }

    /// Preprocessor symbol defined when the property is used.
    pub fn define_name(self) -> String {
        let mut define = String::from("MATERIAL_HAS_");
        for c in self.name().chars() {
            if c.is_ascii_uppercase() {
                define.push('_');
            }
            define.push(c.to_ascii_uppercase());
        }
        define
    }

    /// Properties written from `materialVertex()` rather than `material()`.
    pub fn is_vertex(self) -> bool {
        self == Self::ClipSpaceTransform
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    fn bit(self) -> u64 {
        1 << (self as u32)
    }
}

/// Fixed-size set of [`Property`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertySet {
    bits: u64,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing every property.
    pub fn all() -> Self {
        Property::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, property: Property) {
        self.bits |= property.bit();
    }

    pub fn remove(&mut self, property: Property) {
        self.bits &= !property.bit();
    }

    pub fn contains(&self, property: Property) -> bool {
        self.bits & property.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Contained properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Property> + '_ {
        Property::ALL.into_iter().filter(|p| self.contains(*p))
    }

    /// Serialized form: bit `n` set when property `n` is used.
    pub fn to_bits(&self) -> u64 {
        self.bits
    }
}

impl FromIterator<Property> for PropertySet {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut set = Self::new();
        for property in iter {
            set.insert(property);
        }
        set
    }
}

impl Extend<Property> for PropertySet {
    fn extend<I: IntoIterator<Item = Property>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property);
        }
    }
}
