pub trait Sink<T> {
    fn publish(&mut self, data: T);
}

pub struct NoSink;

impl<T> Sink<T> for NoSink {
    fn publish(&mut self, _: T) {}
}
