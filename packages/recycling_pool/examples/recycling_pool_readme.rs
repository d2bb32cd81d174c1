//! Walks one object through its whole lifecycle: allocation, reference counting, reclamation
//! into the free pool and reuse.

use std::sync::Arc;

use recycling_pool::{EventLog, Poolable, RecyclingPool, Release, TypeTag};

const ENVELOPE: TypeTag = TypeTag::new("envelope");

/// A message envelope with a reusable body buffer.
#[derive(Debug)]
struct Envelope {
    topic: String,
    body: Vec<u8>,
}

impl Poolable for Envelope {
    fn type_tag(&self) -> TypeTag {
        ENVELOPE
    }

    fn size_hint(&self) -> usize {
        size_of::<Self>() + self.topic.capacity() + self.body.capacity()
    }
}

fn main() {
    let log = EventLog::new();
    let pool = RecyclingPool::builder()
        .event_sink(Arc::new(log.clone()))
        .build();

    let id = pool.allocate(Envelope {
        topic: "orders".to_string(),
        body: Vec::with_capacity(256),
    });
    println!("Allocated {id}, memory usage {} bytes", pool.memory_usage());

    // A second holder appears and goes away again.
    pool.increase_ref(id).unwrap();
    pool.decrease_ref(id).unwrap();

    // Releasing the last reference reclaims the envelope into the free pool.
    if let Ok(Release::Reclaimed(bucket)) = pool.decrease_ref(id) {
        println!("Reclaimed {id} into bucket {bucket}");
    }
    println!("Memory usage after release: {} bytes", pool.memory_usage());

    // The next request for an envelope gets the recycled one, body buffer included.
    match pool.reuse(Some(ENVELOPE), 50) {
        Some(reused) => {
            let capacity = pool.with(reused, |envelope| envelope.body.capacity()).unwrap();
            println!("Reused envelope as {reused} with a {capacity} byte body buffer");
        }
        None => println!("No envelope available for reuse"),
    }
    println!("Memory usage after reuse: {} bytes", pool.memory_usage());

    println!("\nEvents reported by the pool:");
    for event in log.events() {
        println!("  {event:?}");
    }
}
