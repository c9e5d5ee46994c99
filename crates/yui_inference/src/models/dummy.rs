use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;
use yui_core::{Error, GenerationOracle, Result};
use crate::prompts::PromptKind;

#[derive(Default)]
struct Script {
    queued: HashMap<PromptKind, VecDeque<Result<String>>>,
    defaults: HashMap<PromptKind, String>,
    calls: HashMap<PromptKind, usize>,
}

/// Offline oracle that replays scripted replies per prompt kind.
///
/// Queued replies are used first, in order; after that the kind's default is
/// repeated. A kind with neither fails like an unreachable backend.
#[derive(Default)]
pub struct DummyModel {
    script: Mutex<Script>,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model that always produces the same valid topic and article.
    pub fn canned() -> Self {
        Self::new()
            .with_default(PromptKind::Topic, CANNED_TOPIC)
            .with_default(PromptKind::Article, CANNED_ARTICLE)
            .with_default(PromptKind::Equivalence, "DIFFERENT")
            .with_default(PromptKind::Category, "office")
    }

    pub fn with_response(self, kind: PromptKind, reply: impl Into<String>) -> Self {
        self.push(kind, Ok(reply.into()));
        self
    }

    pub fn with_failure(self, kind: PromptKind, reason: impl Into<String>) -> Self {
        self.push(kind, Err(Error::Inference(reason.into())));
        self
    }

    pub fn with_default(self, kind: PromptKind, reply: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.defaults.insert(kind, reply.into());
        }
        self
    }

    /// Number of prompts of `kind` seen so far.
    pub fn calls(&self, kind: PromptKind) -> usize {
        self.script
            .lock()
            .map(|s| s.calls.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn push(&self, kind: PromptKind, reply: Result<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.queued.entry(kind).or_default().push_back(reply);
        }
    }
}

#[async_trait::async_trait]
impl GenerationOracle for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let kind = PromptKind::detect(prompt)
            .ok_or_else(|| Error::Inference("prompt has no task header".to_string()))?;
        let mut script = self
            .script
            .lock()
            .map_err(|_| Error::Inference("dummy script lock poisoned".to_string()))?;
        *script.calls.entry(kind).or_insert(0) += 1;

        if let Some(reply) = script.queued.get_mut(&kind).and_then(|q| q.pop_front()) {
            return reply;
        }
        script
            .defaults
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::Inference(format!("no scripted reply for {} prompt", kind)))
    }
}

const CANNED_TOPIC: &str = "タイトル：新しい職場で好きな人ができたが告白のタイミングが分からない
質問：転職して三か月、同じチームの二つ年上の先輩を好きになりました。仕事を丁寧に教えてくれて、先週は二人で遅くまで残業した帰りにラーメンを食べに行きました。でも社内恋愛は周りの目もあるし、振られたら毎日顔を合わせるのが気まずくなると思うと、なかなか一歩が踏み出せません。いつ、どうやって気持ちを伝えればいいのでしょうか。";

const CANNED_ARTICLE: &str = r#"{
  "lead": "恋する乙女の皆さん、こんにちは。ゆい姉さんです。今日は職場の先輩に恋をした方からの相談です。",
  "summary_answer": "焦って告白するより、まずは仕事以外で二人きりになる時間を自然に増やしていきましょう。",
  "psychology": "職場という公共の場では、男性は周囲の目と自分の評価を強く意識しています。残業後の食事に応じたのは、少なくともあなたと過ごす時間を好意的に受け止めている証拠です。",
  "actions": [
    "仕事のお礼を口実に、休日のランチに誘ってみる",
    "社内では今まで通りの距離感を保つ",
    "彼の好きなものを会話の中でさりげなく聞き出す"
  ],
  "avoid": [
    "同僚に相談して噂を広めてしまうこと",
    "勢いで深夜に長文のメッセージを送ること"
  ],
  "misunderstanding": "優しくしてくれるのは仕事だからと決めつけるのは早計です。食事の誘いに乗るのは、興味のない相手にはしないことですよ。",
  "conclusion": "一歩踏み出す勇気が、きっと新しい関係の扉を開きます。ゆい姉さんは応援していますよ。"
}"#;
