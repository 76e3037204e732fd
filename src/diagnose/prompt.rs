// src/diagnose/prompt.rs
//! Prompt assembly for the persona critique.
//!
//! The request fields are substituted verbatim, no escaping and no
//! truncation; the model sees exactly what the user typed. The output
//! schema pinned at the end is what `parse` expects back.

use std::fmt::Write as _;

use crate::config::DiagnosisVariant;

use super::request::DiagnosisRequest;

const PROMPT_HEADER: &str = "\
あなたはSNS（特にX/Twitter）における「炎上リスク判定」のプロフェッショナルです。
以下の投稿を入力とし、4つの異なる視点（キャラクター）から辛口で分析を行ってください。
";

const ANALYSIS_REQUIREMENTS: &str = "\
【分析要件】
以下の4つの視点でリスクを評価し、コメントしてください。
1. 【学級委員長】: マナー・倫理観・社会通念上の正しさ基準。真面目な口調。
2. 【京都の老舗女将】: 特有の「いけず」な視点。京都弁で、遠回しだが強烈な皮肉。
3. 【クソリプおじさん】: 頼んでもいないアドバイス、自分語り、上から目線の説教。「FF外から失礼します」等。
4. 【特定班】: 写真やテキストからの個人情報特定、場所特定のリスク。

※「公式垢」の場合は、些細な表現でもリスク判定を厳しく跳ね上げてください。
";

const EXTENDED_REQUIREMENTS: &str = "\
【追加分析】
- 投稿の言語を判定し、\"detected_language\" に言語名を記入してください。
- 次の5地域それぞれについて炎上リスク(0〜100の整数)と理由を \"regional_analysis\" に記入してください。
  \"region\" キーは英語表記のまま、次の順で出力してください: Japan, Asia, Americas, Europe, Global。
  \"reason\" は投稿の言語で記述してください。
";

const OUTPUT_HEADER: &str = "\
【出力形式】
必ず以下のJSONフォーマットのみを出力してください。Markdownのコードブロック(```json)は不要です。
";

const BASE_OUTPUT_SCHEMA: &str = r#"{
    "total_score": (0〜100の整数。100が高リスク),
    "critiques": {
        "class_rep": { "rating": (1〜5の整数), "comment": "..." },
        "kyoto_okami": { "rating": (1〜5の整数), "comment": "..." },
        "reply_ojisan": { "rating": (1〜5の整数), "comment": "..." },
        "doxing_team": { "rating": (1〜5の整数), "comment": "..." }
    },
    "summary": "全体の総評（100文字以内）"
}"#;

const EXTENDED_OUTPUT_SCHEMA: &str = r#"{
    "total_score": (0〜100の整数。100が高リスク),
    "detected_language": "言語名",
    "critiques": {
        "class_rep": { "rating": (0〜5の整数), "comment": "..." },
        "kyoto_okami": { "rating": (0〜5の整数), "comment": "..." },
        "reply_ojisan": { "rating": (0〜5の整数), "comment": "..." },
        "doxing_team": { "rating": (0〜5の整数), "comment": "..." }
    },
    "regional_analysis": [
        { "region": "Japan", "risk_score": (0〜100の整数), "reason": "..." },
        { "region": "Asia", "risk_score": (0〜100の整数), "reason": "..." },
        { "region": "Americas", "risk_score": (0〜100の整数), "reason": "..." },
        { "region": "Europe", "risk_score": (0〜100の整数), "reason": "..." },
        { "region": "Global", "risk_score": (0〜100の整数), "reason": "..." }
    ],
    "summary": "全体の総評（100文字以内）"
}"#;

/// Build the full prompt for one submission.
pub fn build_prompt(req: &DiagnosisRequest, variant: DiagnosisVariant) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(PROMPT_HEADER);

    out.push_str("\n【入力情報】\n");
    let _ = writeln!(out, "- 投稿者属性: {}", req.author_category.label());
    let _ = writeln!(out, "- 投稿テキスト: {}", req.post_text);
    let _ = writeln!(out, "- プロフィール詳細: {}", req.profile);
    let _ = writeln!(
        out,
        "- 過去の炎上経験: {}",
        if req.has_history { "あり" } else { "なし" }
    );
    if variant == DiagnosisVariant::Extended {
        match req.age {
            Some(age) => {
                let _ = writeln!(out, "- 投稿者年齢: {age}歳");
            }
            None => {
                let _ = writeln!(out, "- 投稿者年齢: 不明");
            }
        }
    }

    out.push('\n');
    out.push_str(ANALYSIS_REQUIREMENTS);

    if variant == DiagnosisVariant::Extended {
        out.push('\n');
        out.push_str(EXTENDED_REQUIREMENTS);
    }

    out.push('\n');
    out.push_str(OUTPUT_HEADER);
    out.push_str(match variant {
        DiagnosisVariant::Base => BASE_OUTPUT_SCHEMA,
        DiagnosisVariant::Extended => EXTENDED_OUTPUT_SCHEMA,
    });
    out.push('\n');

    out
}
