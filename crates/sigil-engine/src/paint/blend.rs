/// How new fragments combine with what is already in the back buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// `src * src.a + dst * (1 - src.a)`.
    #[default]
    Alpha,
    /// `src * src.a + dst`. Used for glows and particles.
    Additive,
}

impl BlendMode {
    #[inline]
    pub fn from_additive(additive: bool) -> Self {
        if additive { BlendMode::Additive } else { BlendMode::Alpha }
    }

    pub(crate) fn wgpu_state(self) -> wgpu::BlendState {
        let dst_factor = match self {
            BlendMode::Alpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendMode::Additive => wgpu::BlendFactor::One,
        };
        wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }
    }
}
