//! End-to-end behaviour of the annotation pipeline on the in-memory store

use std::collections::HashSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use serde_json::{json, Value};
use tokio_test::assert_ok;

use snippet_store::{
    AnnotationValue, Annotator, Flag, FlagChange, MemoryPictureStore, Mutator, PictureDoc,
    PictureRepository, Selector, SnippetError, Status, StatusAggregator,
};

struct Pipeline {
    repo: PictureRepository,
    selector: Selector,
    mutator: Mutator,
    status: StatusAggregator,
}

fn pipeline() -> Pipeline {
    let repo = PictureRepository::new(Arc::new(MemoryPictureStore::new()));
    Pipeline {
        selector: Selector::new(repo.clone()),
        mutator: Mutator::new(repo.clone()),
        status: StatusAggregator::new(repo.clone()),
        repo,
    }
}

/// Legacy-shaped picture with one region and one empty value entry
fn legacy_picture(index: usize) -> Value {
    json!({
        "PiFF": {
            "Meta": { "Type": "line", "URL": "" },
            "Location": [
                { "Type": "line", "Polygon": [[0, 0], [0, 0], [0, 0], [0, 0]], "Id": "loc_0" }
            ],
            "Data": [
                { "Type": "line", "LocationId": "loc_0", "Value": "", "Id": "0" }
            ],
            "Children": null,
            "Parent": 0
        },
        "Url": format!("/temp/none{}", index),
        "Filename": format!("none{}.png", index),
        "Annotated": false,
        "Corrected": false,
        "SentToReco": false,
        "Unreadable": false,
        "Annotator": ""
    })
}

async fn insert_legacy(p: &Pipeline, count: usize) -> Vec<ObjectId> {
    let docs = (0..count).map(legacy_picture).collect();
    p.repo.insert_batch(docs).await.unwrap()
}

#[tokio::test]
async fn inserted_records_resolve_to_their_input() {
    let p = pipeline();
    let inputs: Vec<Value> = (0..5).map(legacy_picture).collect();

    let ids = p.repo.insert_batch(inputs.clone()).await.unwrap();
    assert_eq!(ids.len(), inputs.len());

    for (id, input) in ids.iter().zip(inputs) {
        let stored = p.repo.find_by_id(*id).await.unwrap();
        assert_eq!(stored.id, Some(*id));

        let expected: PictureDoc = serde_json::from_value(input).unwrap();
        assert_eq!(PictureDoc { id: None, ..stored }, expected);
    }
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let p = pipeline();
    insert_legacy(&p, 2).await;

    let result = p.repo.find_by_id(ObjectId::new()).await;
    assert!(matches!(result, Err(SnippetError::NotFound(_))));
}

#[tokio::test]
async fn recognizer_claims_never_repeat() {
    let p = pipeline();
    insert_legacy(&p, 10).await;

    let first = p.selector.for_recognizer(4).await.unwrap();
    assert_eq!(first.len(), 4);
    let first_ids: HashSet<ObjectId> = first.iter().filter_map(|pic| pic.id).collect();

    let second = p.selector.for_recognizer(10).await.unwrap();
    assert_eq!(second.len(), 6);
    assert!(second
        .iter()
        .all(|pic| !first_ids.contains(&pic.id.unwrap())));
}

#[tokio::test]
async fn selections_respect_annotation_state() {
    let p = pipeline();
    let ids = insert_legacy(&p, 6).await;

    // two recognizer proposals, two human annotations, two untouched
    let claimed = p.selector.for_recognizer(2).await.unwrap();
    let proposals: Vec<AnnotationValue> = claimed
        .iter()
        .map(|pic| AnnotationValue::new(pic.id.unwrap(), "proposal"))
        .collect();
    assert_ok!(
        p.mutator
            .apply_annotation_values(&proposals, &Annotator::Recognizer)
            .await
    );

    let claimed_ids: HashSet<ObjectId> = claimed.iter().filter_map(|pic| pic.id).collect();
    let humans: Vec<AnnotationValue> = ids
        .iter()
        .filter(|id| !claimed_ids.contains(id))
        .take(2)
        .map(|id| AnnotationValue::new(*id, "typed"))
        .collect();
    assert_ok!(
        p.mutator
            .apply_annotation_values(&humans, &Annotator::from_name("bob"))
            .await
    );

    let suggestions = p.selector.with_suggestion(10).await.unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions
        .iter()
        .all(|pic| matches!(pic.annotator, Some(Annotator::Recognizer))));

    let unused = p.selector.unused(10).await.unwrap();
    assert_eq!(unused.len(), 2);
    assert!(unused.iter().all(|pic| !pic.annotated));

    assert_eq!(
        p.status.compute_status().await.unwrap(),
        Status {
            total: 6,
            annotated: 2,
            unreadable: 0,
        }
    );
}

#[tokio::test]
async fn empty_collection_status_is_zero() {
    let p = pipeline();
    assert_eq!(p.status.compute_status().await.unwrap(), Status::default());
}

#[tokio::test]
async fn flag_changes_touch_only_their_record() {
    let p = pipeline();
    let ids = insert_legacy(&p, 2).await;

    let payload = json!([
        { "Id": ids[0].to_hex(), "flag": "Unreadable", "value": true },
        { "Id": ids[1].to_hex(), "flag": "Corrected", "value": true }
    ]);
    let changes: Vec<FlagChange> = serde_json::from_value(payload).unwrap();
    p.mutator.apply_flag_changes(&changes).await.unwrap();

    let doc0 = p.repo.find_by_id(ids[0]).await.unwrap();
    for flag in Flag::ALL {
        assert_eq!(doc0.flag(flag), flag == Flag::Unreadable, "doc0 {}", flag);
    }

    let doc1 = p.repo.find_by_id(ids[1]).await.unwrap();
    for flag in Flag::ALL {
        assert_eq!(doc1.flag(flag), flag == Flag::Corrected, "doc1 {}", flag);
    }
}

#[tokio::test]
async fn annotation_values_record_text_and_attribution() {
    let p = pipeline();
    let ids = insert_legacy(&p, 2).await;

    let hello: Vec<AnnotationValue> =
        serde_json::from_value(json!([{ "Id": ids[0].to_hex(), "value": "hello" }])).unwrap();
    p.mutator
        .apply_annotation_values(&hello, &Annotator::from_name("unspecified"))
        .await
        .unwrap();

    let world: Vec<AnnotationValue> =
        serde_json::from_value(json!([{ "Id": ids[1].to_hex(), "value": "world" }])).unwrap();
    p.mutator
        .apply_annotation_values(&world, &Annotator::from_name("alice"))
        .await
        .unwrap();

    let doc0 = p.repo.find_by_id(ids[0]).await.unwrap();
    assert_eq!(doc0.annotation.first_value(), Some("hello"));
    assert!(doc0.annotated);
    assert_eq!(doc0.annotator.as_ref().map(Annotator::as_stored), Some("unspecified"));

    let doc1 = p.repo.find_by_id(ids[1]).await.unwrap();
    assert_eq!(doc1.annotation.first_value(), Some("world"));
    assert!(doc1.annotated);
    assert_eq!(doc1.annotator.as_ref().map(Annotator::as_stored), Some("alice"));

    let stored = serde_json::to_value(&doc1).unwrap();
    assert_eq!(stored["Annotator"], "alice");
    assert_eq!(stored["PiFF"]["Data"][0]["Value"], "world");
}

#[tokio::test]
async fn delete_all_is_idempotent() {
    let p = pipeline();
    insert_legacy(&p, 3).await;

    assert_eq!(p.repo.delete_all().await.unwrap(), 3);
    assert!(p.repo.find_all().await.unwrap().is_empty());

    assert_eq!(p.repo.delete_all().await.unwrap(), 0);
    assert!(p.repo.find_all().await.unwrap().is_empty());

    assert_eq!(p.status.compute_status().await.unwrap(), Status::default());
}
