pub trait Reset {
    fn reset(&mut self) -> !;
}
