use std::fmt;
use yui_core::{Category, Topic, TopicDraft};

pub const TITLE_MARKER: &str = "タイトル：";
pub const BODY_MARKER: &str = "質問：";
const TASK_PREFIX: &str = "### task: ";

/// What a prompt asks the oracle for. Every prompt built here starts with a
/// `### task: <kind>` line so scripted oracles can route on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Topic,
    Article,
    Equivalence,
    Category,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Topic => "topic",
            PromptKind::Article => "article",
            PromptKind::Equivalence => "equivalence",
            PromptKind::Category => "category",
        }
    }

    pub fn detect(prompt: &str) -> Option<PromptKind> {
        let first = prompt.lines().next()?.trim();
        let kind = first.strip_prefix(TASK_PREFIX)?;
        [
            PromptKind::Topic,
            PromptKind::Article,
            PromptKind::Equivalence,
            PromptKind::Category,
        ]
        .into_iter()
        .find(|k| k.as_str() == kind.trim())
    }

    fn header(&self) -> String {
        format!("{}{}", TASK_PREFIX, self.as_str())
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn topic_prompt(min_title_chars: usize, min_body_chars: usize) -> String {
    format!(
        "{header}
あなたは「実体験ベースの恋愛・人間関係の悩み相談」を1件生成してください。

【厳守】
・テンプレ・抽象論は禁止
・期間、関係性、具体的な出来事を必ず含める
・感情の揺れや迷いをはっきり書く
・ネットでよく見る定番相談は禁止

【形式】
{title}{min_title}文字以上
{body}{min_body}文字以上",
        header = PromptKind::Topic.header(),
        title = TITLE_MARKER,
        body = BODY_MARKER,
        min_title = min_title_chars,
        min_body = min_body_chars,
    )
}

pub fn article_prompt(topic: &Topic) -> String {
    format!(
        "{header}
あなたは恋愛相談に答える「ゆい姉さん」です。次の相談に回答してください。

{title}{topic_title}
{body}{topic_body}

次のキーを持つJSONオブジェクトだけを出力してください。
- \"lead\": 読者への導入文
- \"summary_answer\": 結論（ズバリ回答）
- \"psychology\": 相手の心理・理由の解説
- \"actions\": 今日からできる行動（3つ以上の文字列の配列）
- \"avoid\": やってはいけないこと（2つ以上の文字列の配列）
- \"misunderstanding\": よくある勘違いとその正し方
- \"conclusion\": 締めのメッセージ",
        header = PromptKind::Article.header(),
        title = TITLE_MARKER,
        body = BODY_MARKER,
        topic_title = topic.title,
        topic_body = topic.body,
    )
}

pub fn equivalence_prompt(candidate: &TopicDraft, recent: &[Topic]) -> String {
    let listed = recent
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}{} / {}{}", i + 1, TITLE_MARKER, t.title, BODY_MARKER, t.body))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{header}
次の【新しい相談】が、【既存の相談】のいずれかと同じ状況を言い換えただけのものか判定してください。

【新しい相談】
{title}{cand_title}
{body}{cand_body}

【既存の相談】
{listed}

同じ状況のものがあれば SAME と番号（例: SAME 2）、なければ DIFFERENT とだけ答えてください。",
        header = PromptKind::Equivalence.header(),
        title = TITLE_MARKER,
        body = BODY_MARKER,
        cand_title = candidate.title,
        cand_body = candidate.body,
        listed = listed,
    )
}

pub fn category_prompt(candidate: &TopicDraft) -> String {
    let labels = Category::ALL
        .iter()
        .map(|c| format!("- {} ({})", c.label(), c.gloss()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{header}
次の相談に最も当てはまるカテゴリを一つだけ選び、ラベルのみを答えてください。

{labels}

{title}{cand_title}
{body}{cand_body}",
        header = PromptKind::Category.header(),
        labels = labels,
        title = TITLE_MARKER,
        body = BODY_MARKER,
        cand_title = candidate.title,
        cand_body = candidate.body,
    )
}
