//! 交互式会话循环

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use verirag_core::Result as CoreResult;
use verirag_rag::{Orchestrator, Outcome, RunReport};

pub const PROMPT: &str = "You: ";
pub const NO_ANSWER: &str = "I'm sorry, I don't have an answer for that.";
pub const FAULT: &str = "I'm sorry, something went wrong while answering that.";

/// `exit` / `quit`, 不区分大小写
pub fn is_exit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// 每个问题恰好对应一行输出
pub fn render_reply(result: CoreResult<RunReport>) -> String {
    match result {
        Ok(report) => match report.outcome {
            Outcome::Answered { answer, .. } => format!("Bot: {}", answer),
            Outcome::NoAnswer => NO_ANSWER.to_string(),
        },
        Err(e) => {
            tracing::warn!("Question failed: {}", e);
            FAULT.to_string()
        }
    }
}

/// 逐行读取问题直到 exit/quit 或输入结束, 返回处理过的问题数
pub async fn run_session<R, W>(orchestrator: &Orchestrator, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };

        // 空行同样作为问题处理
        let question = line.trim();
        if is_exit(question) {
            break;
        }

        let reply = render_reply(orchestrator.answer(question).await);
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        answered += 1;
    }

    output.flush().await?;
    Ok(answered)
}
