/// Texture handles an actuator face can show. Opaque to the core; the
/// renderer resolves them through [`ActuatorTexture::atlas_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorTexture {
    TopNormal,
    TopSticky,
    /// Exposed pushing face of an extended base.
    Inner,
    Bottom,
    Side,
}

impl ActuatorTexture {
    pub const ALL: [ActuatorTexture; 5] = [
        ActuatorTexture::TopNormal,
        ActuatorTexture::TopSticky,
        ActuatorTexture::Inner,
        ActuatorTexture::Bottom,
        ActuatorTexture::Side,
    ];

    /// The cap texture for a variant.
    pub fn top(sticky: bool) -> Self {
        if sticky {
            ActuatorTexture::TopSticky
        } else {
            ActuatorTexture::TopNormal
        }
    }

    pub fn atlas_name(self) -> &'static str {
        match self {
            ActuatorTexture::TopNormal => "piston_top_normal",
            ActuatorTexture::TopSticky => "piston_top_sticky",
            ActuatorTexture::Inner => "piston_inner",
            ActuatorTexture::Bottom => "piston_bottom",
            ActuatorTexture::Side => "piston_side",
        }
    }
}
