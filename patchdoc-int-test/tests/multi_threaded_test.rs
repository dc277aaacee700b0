use patchdoc::doc;
use patchdoc::repository::Query;
use patchdoc::update::{build_partial_update, PartialUpdateBuilder, UpdatePayload};
use patchdoc_derive::{Convertible, Entity, Patchable};
use patchdoc_int_test::test_util::{cleanup, create_test_context, run_test};
use std::sync::{Arc, Barrier};
use std::thread;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Default, Clone, Patchable, Convertible, Entity)]
#[entity(name = "counters")]
pub struct Counter {
    #[patch(rename = "_id")]
    pub id: Option<String>,
    pub owner: Option<String>,
    pub value: Option<i64>,
    #[patch(transient)]
    pub dirty: Option<bool>,
}

fn render(payload: &UpdatePayload) -> String {
    payload.to_string()
}

#[test]
fn test_concurrent_builds_on_shared_record() {
    let record = Arc::new(Counter {
        id: Some("c1".to_string()),
        owner: Some("ops".to_string()),
        value: Some(7),
        dirty: Some(true),
    });
    let expected = render(&build_partial_update(record.as_ref(), &["_id"]).unwrap());

    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));
    let mut handles = vec![];

    for _ in 0..num_threads {
        let record = Arc::clone(&record);
        let barrier = Arc::clone(&barrier);

        handles.push(thread::spawn(move || {
            barrier.wait();
            let builder = PartialUpdateBuilder::new().exclude("_id");
            (0..100)
                .map(|_| builder.build(record.as_ref()).map(|p| render(&p)))
                .collect::<Vec<_>>()
        }));
    }

    for handle in handles {
        let results = handle.join().expect("builder thread panicked");
        for result in results {
            assert_eq!(result.unwrap(), expected);
        }
    }
    assert_eq!(expected, r#"{"owner": "ops", "value": 7}"#);
}

#[test]
fn test_concurrent_repository_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let factory = ctx.factory();
            let num_threads = 5;
            let writes_per_thread = 10;
            let barrier = Arc::new(Barrier::new(num_threads));

            let mut handles = vec![];
            for thread_id in 0..num_threads {
                let factory = factory.clone();
                let barrier = Arc::clone(&barrier);

                handles.push(thread::spawn(move || {
                    barrier.wait();
                    let counters = factory.repository::<Counter>()?;
                    for i in 0..writes_per_thread {
                        let counter = Counter {
                            owner: Some(format!("thread_{}", thread_id)),
                            value: Some(i as i64),
                            ..Default::default()
                        };
                        let update = counters.build_base_update(&counter, &[])?;
                        let query = Query::new(doc! { "_id": (format!("{}_{}", thread_id, i)) });
                        counters.upsert(&query, &update)?;
                    }
                    Ok::<(), patchdoc::errors::PatchError>(())
                }));
            }

            for handle in handles {
                handle.join().expect("writer thread panicked")?;
            }

            let counters = factory.repository::<Counter>()?;
            assert_eq!(factory.cached_entities(), 1);
            assert_eq!(
                counters.count(&Query::all())?,
                (num_threads * writes_per_thread) as u64
            );
            assert_eq!(
                counters.count(&Query::new(doc! { "owner": "thread_3" }))?,
                writes_per_thread as u64
            );
            Ok(())
        },
        cleanup,
    )
}
