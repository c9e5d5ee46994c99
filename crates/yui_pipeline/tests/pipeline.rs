use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use yui_core::{Category, Conflict, Error, GenerationOracle, Result, TopicDraft, TopicStatus, TopicStore};
use yui_inference::models::dummy::DummyModel;
use yui_inference::prompts::PromptKind;
use yui_pipeline::prelude::*;
use yui_storage::{JsonFileStorage, MemoryStorage};

const TOPICS: [(&str, &str); 4] = [
    (
        "新しい職場で好きな人ができたが告白のタイミングが分からない",
        "転職して三か月、同じチームの二つ年上の先輩を好きになりました。仕事を丁寧に教えてくれて、先週は二人で遅くまで残業した帰りにラーメンを食べに行きました。でも社内恋愛は周りの目もあるし、振られたら毎日顔を合わせるのが気まずくなると思うと、なかなか一歩が踏み出せません。",
    ),
    (
        "付き合って五年の彼氏に結婚の話をすると毎回はぐらかされる",
        "大学時代から五年付き合っている彼がいます。私は今年三十歳になり、そろそろ将来のことを考えたいのですが、結婚の話題を出すと彼は決まって仕事が落ち着いたらと言って話を変えます。友人たちが次々に結婚していく中で、待ち続けていいのか、それとも見切りをつけるべきなのか分からなくなってきました。",
    ),
    (
        "マッチングアプリで三回会った人から急に返信が来なくなった",
        "アプリで知り合った同い年の男性と、映画、水族館、居酒屋と三回デートしました。毎回楽しくて、次は紅葉を見に行こうと約束していたのに、先週から既読すらつきません。何か失礼なことをしたのか思い返しても心当たりがなく、もう一度だけ連絡してみるべきか、このまま忘れるべきか迷っています。",
    ),
    (
        "元彼の浮気が原因で別れたのに今でも夢に見てしまい苦しい",
        "半年前、二年付き合った元彼が職場の後輩と浮気していたことが分かり、私から別れを告げました。自分の判断は正しかったと思っているのに、いまだに彼が夢に出てきて、朝起きると涙が止まらない日があります。新しい出会いを探す気にもなれず、どうすればこの気持ちを過去のものにできるのでしょうか。",
    ),
];

fn reply(i: usize) -> String {
    format!("タイトル：{}\n質問：{}", TOPICS[i].0, TOPICS[i].1)
}

fn config(max_attempts: u32) -> PipelineConfig {
    PipelineConfig {
        max_attempts,
        oracle_timeout_secs: 5,
        ..PipelineConfig::default()
    }
}

fn judged(model: DummyModel) -> DummyModel {
    model
        .with_default(PromptKind::Equivalence, "DIFFERENT")
        .with_default(PromptKind::Category, "office")
}

async fn seed(store: &dyn TopicStore, indexes: &[usize], category: Category) {
    for &i in indexes {
        let mut draft = TopicDraft::new(TOPICS[i].0, TOPICS[i].1);
        draft.category = Some(category);
        store.commit(draft).await.unwrap();
    }
}

#[tokio::test]
async fn test_end_to_end_scenario_on_empty_store() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("questions.json");
    let store = Arc::new(JsonFileStorage::open(&path).unwrap());
    let model = Arc::new(judged(DummyModel::new().with_response(PromptKind::Topic, reply(0))));
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(5));

    let outcome = pipeline.run_topic().await.unwrap();
    assert_eq!(outcome.stage(), Stage::Done);
    let topic = outcome.topic().unwrap();
    assert_eq!(topic.slug, TOPICS[0].0);
    assert_eq!(topic.url, format!("https://yui-love.vercel.app/posts/{}.html", TOPICS[0].0));
    assert_eq!(topic.category, Category::Office);
    assert_eq!(topic.status, TopicStatus::Pending);
    assert_eq!(topic.fingerprint, yui_core::fingerprint(TOPICS[0].0, TOPICS[0].1));

    // Cold start: no history, so no equivalence prompt was needed.
    assert_eq!(model.calls(PromptKind::Equivalence), 0);
    assert_eq!(store.all().await.unwrap().len(), 1);

    let reopened = JsonFileStorage::open(&path).unwrap();
    assert_eq!(reopened.all().await.unwrap(), vec![topic.clone()]);
}

#[tokio::test]
async fn test_second_run_with_same_output_commits_nothing() {
    let store = Arc::new(MemoryStorage::new());
    let model = Arc::new(judged(DummyModel::new().with_default(PromptKind::Topic, reply(0))));
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(5));

    assert!(matches!(pipeline.run_topic().await.unwrap(), TopicOutcome::Done(_)));
    assert_eq!(store.all().await.unwrap().len(), 1);

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { attempts, rejections } => {
            assert_eq!(attempts, 5);
            assert_eq!(rejections, vec![Rejection::ExactDuplicate; 5]);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(store.all().await.unwrap().len(), 1);
    assert_eq!(model.calls(PromptKind::Topic), 6);
}

#[tokio::test]
async fn test_forward_progress_under_noise() {
    let store = Arc::new(MemoryStorage::new());
    let model = Arc::new(judged(
        DummyModel::new()
            .with_failure(PromptKind::Topic, "connection reset")
            .with_response(PromptKind::Topic, "申し訳ありませんが、その依頼にはお応えできません。")
            .with_response(PromptKind::Topic, "タイトル：短すぎる相談\n質問：短い本文です。")
            .with_response(PromptKind::Topic, reply(1)),
    ));
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(5));

    let outcome = pipeline.run_topic().await.unwrap();
    assert_eq!(outcome.stage(), Stage::Done);
    assert_eq!(outcome.topic().unwrap().title, TOPICS[1].0);
    assert_eq!(model.calls(PromptKind::Topic), 4);
    assert_eq!(store.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_all_noise_exhausts_without_error() {
    let store = Arc::new(MemoryStorage::new());
    let model = Arc::new(judged(DummyModel::new()));
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(3));

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { attempts, rejections } => {
            assert_eq!(attempts, 3);
            assert_eq!(rejections.len(), 3);
            assert!(rejections.iter().all(|r| matches!(r, Rejection::Oracle(_))));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rotation_rejects_fourth_breakup() {
    let store = Arc::new(MemoryStorage::new());
    seed(store.as_ref(), &[1, 2, 3], Category::Breakup).await;

    let model = Arc::new(
        DummyModel::new()
            .with_default(PromptKind::Topic, reply(0))
            .with_default(PromptKind::Equivalence, "DIFFERENT")
            .with_response(PromptKind::Category, "breakup")
            .with_response(PromptKind::Category, "office"),
    );
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(1));

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { rejections, .. } => {
            assert_eq!(rejections, vec![Rejection::Rotation(Category::Breakup)]);
        }
        other => panic!("expected rotation rejection, got {:?}", other),
    }
    assert_eq!(store.all().await.unwrap().len(), 3);

    // The same text passes once it lands in a different category.
    let outcome = pipeline.run_topic().await.unwrap();
    assert_eq!(outcome.topic().unwrap().category, Category::Office);
    assert_eq!(store.all().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_semantic_duplicate_is_rejected() {
    let store = Arc::new(MemoryStorage::new());
    seed(store.as_ref(), &[1], Category::Marriage).await;

    let model = Arc::new(
        DummyModel::new()
            .with_default(PromptKind::Topic, reply(0))
            .with_default(PromptKind::Category, "office")
            .with_response(PromptKind::Equivalence, "SAME 1")
            .with_failure(PromptKind::Equivalence, "model overloaded"),
    );
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(2));

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { rejections, .. } => {
            assert_eq!(rejections.len(), 2);
            assert!(rejections.iter().all(|r| matches!(r, Rejection::SemanticDuplicate(_))));
        }
        other => panic!("expected semantic rejection, got {:?}", other),
    }
    assert_eq!(store.all().await.unwrap().len(), 1);
    assert_eq!(model.calls(PromptKind::Category), 0);
}

#[tokio::test]
async fn test_committed_topics_stay_unique() {
    let store = Arc::new(MemoryStorage::new());
    let same_title = |body: &str| format!("タイトル：{}\n質問：{}", TOPICS[0].0, body);
    let model = Arc::new(judged(
        DummyModel::new()
            .with_response(PromptKind::Topic, same_title(TOPICS[0].1))
            .with_response(PromptKind::Topic, same_title(TOPICS[0].1))
            .with_response(PromptKind::Topic, same_title(TOPICS[1].1))
            .with_response(PromptKind::Topic, same_title(TOPICS[2].1)),
    ));
    let pipeline = Pipeline::new(
        model.clone(),
        store.clone(),
        PipelineConfig {
            rotation_k: 0,
            ..config(5)
        },
    );

    let committed = pipeline.run_batch(3).await.unwrap();
    assert_eq!(committed.len(), 3);

    let slugs: Vec<_> = committed.iter().map(|t| t.slug.clone()).collect();
    assert_eq!(
        slugs,
        vec![
            TOPICS[0].0.to_string(),
            format!("{}-2", TOPICS[0].0),
            format!("{}-3", TOPICS[0].0),
        ]
    );

    let all = store.all().await.unwrap();
    let fingerprints: HashSet<_> = all.iter().map(|t| t.fingerprint.as_str()).collect();
    let unique_slugs: HashSet<_> = all.iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(fingerprints.len(), all.len());
    assert_eq!(unique_slugs.len(), all.len());
    let ids: Vec<_> = all.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_batch_stops_at_first_exhausted_run() {
    let store = Arc::new(MemoryStorage::new());
    let model = Arc::new(judged(DummyModel::new().with_response(PromptKind::Topic, reply(2))));
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(2));

    let committed = pipeline.run_batch(3).await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(model.calls(PromptKind::Topic), 3);
}

#[tokio::test]
async fn test_store_failure_is_fatal() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("questions.json");
    let store = Arc::new(JsonFileStorage::open(&path).unwrap());
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("blocker"), "x").unwrap();

    let model = Arc::new(judged(DummyModel::new().with_default(PromptKind::Topic, reply(0))));
    let pipeline = Pipeline::new(model, store.clone(), config(3));

    let err = pipeline.run_topic().await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_article_for_pending_topic() {
    let store = Arc::new(MemoryStorage::new());
    seed(store.as_ref(), &[0], Category::Office).await;
    let model = Arc::new(
        DummyModel::canned().with_response(PromptKind::Article, r#"{"lead": "こんにちは、ゆい姉さんです。今日の相談はこちらです。"}"#),
    );
    let pipeline = Pipeline::new(model.clone(), store.clone(), config(3));

    match pipeline.run_article().await.unwrap() {
        ArticleOutcome::Done { topic, article } => {
            assert_eq!(topic.status, TopicStatus::Done);
            assert_eq!(topic.title, TOPICS[0].0);
            assert_eq!(article.actions.len(), 3);
        }
        other => panic!("expected an article, got {:?}", other),
    }
    assert_eq!(model.calls(PromptKind::Article), 2);
    assert!(matches!(pipeline.run_article().await.unwrap(), ArticleOutcome::NoPendingTopic));
}

#[tokio::test]
async fn test_repeated_article_failures_exhaust_topic() {
    let store = Arc::new(MemoryStorage::new());
    seed(store.as_ref(), &[0], Category::Office).await;
    let model = Arc::new(DummyModel::new().with_default(PromptKind::Article, "記事はまだ書けません"));
    let pipeline = Pipeline::new(
        model.clone(),
        store.clone(),
        PipelineConfig {
            max_article_runs: 3,
            ..config(2)
        },
    );

    for expected in [(1, TopicStatus::Pending), (2, TopicStatus::Pending), (3, TopicStatus::Exhausted)] {
        match pipeline.run_article().await.unwrap() {
            ArticleOutcome::Exhausted { topic, attempts } => {
                assert_eq!(attempts, 2);
                assert_eq!((topic.article_attempts, topic.status), expected);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }
    assert_eq!(model.calls(PromptKind::Article), 6);
    assert!(matches!(pipeline.run_article().await.unwrap(), ArticleOutcome::NoPendingTopic));
    assert_eq!(store.all().await.unwrap()[0].status, TopicStatus::Exhausted);
}

/// Store whose lookups miss, so collisions only surface inside `commit`.
struct BlindStore(MemoryStorage);

#[async_trait::async_trait]
impl TopicStore for BlindStore {
    async fn commit(&self, draft: TopicDraft) -> Result<Topic> {
        self.0.commit(draft).await
    }

    async fn all(&self) -> Result<Vec<Topic>> {
        self.0.all().await
    }

    async fn recent(&self, n: usize) -> Result<Vec<Topic>> {
        self.0.recent(n).await
    }

    async fn has_fingerprint(&self, _fingerprint: &str) -> Result<bool> {
        Ok(false)
    }

    async fn has_slug(&self, _slug: &str) -> Result<bool> {
        Ok(false)
    }

    async fn next_pending(&self) -> Result<Option<Topic>> {
        self.0.next_pending().await
    }

    async fn update_status(&self, id: u64, status: TopicStatus, article_attempts: u32) -> Result<Topic> {
        self.0.update_status(id, status, article_attempts).await
    }
}

#[tokio::test]
async fn test_commit_conflict_is_a_rejection() {
    let inner = MemoryStorage::new();
    seed(&inner, &[0], Category::Office).await;
    let store = Arc::new(BlindStore(inner));

    let model = Arc::new(judged(DummyModel::new().with_default(PromptKind::Topic, reply(0))));
    let pipeline = Pipeline::new(
        model.clone(),
        store.clone(),
        PipelineConfig {
            recency_window: 0,
            rotation_k: 0,
            ..config(2)
        },
    );

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { attempts, rejections } => {
            assert_eq!(attempts, 2);
            assert_eq!(rejections, vec![Rejection::StoreConflict(Conflict::Fingerprint); 2]);
        }
        other => panic!("expected conflict rejections, got {:?}", other),
    }
    assert_eq!(store.all().await.unwrap().len(), 1);
}

#[derive(Debug)]
struct SlowModel;

#[async_trait::async_trait]
impl GenerationOracle for SlowModel {
    fn name(&self) -> &str {
        "Slow"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(reply(0))
    }
}

#[tokio::test]
async fn test_oracle_timeout_is_a_rejection() {
    let store = Arc::new(MemoryStorage::new());
    let pipeline = Pipeline::new(
        Arc::new(SlowModel),
        store.clone(),
        PipelineConfig {
            oracle_timeout_secs: 1,
            ..config(1)
        },
    );

    match pipeline.run_topic().await.unwrap() {
        TopicOutcome::Exhausted { rejections, .. } => {
            assert!(matches!(&rejections[0], Rejection::Oracle(reason) if reason.contains("timed out")));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(store.all().await.unwrap().is_empty());
}
