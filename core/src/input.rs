/// One touch sample from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touch {
    pub x: i32,
    pub y: i32,
    /// Raw pressure reading, used to reject panel noise.
    pub pressure: u16,
}

/// Polled source of touch samples. `None` is the normal no-contact result.
pub trait InputSource {
    fn poll(&mut self) -> Option<Touch>;
}
