mod stream;

pub use stream::InMemoryStreamRepository;
