use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// 檢查子程序狀態的間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 外部工具執行結果
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// 單次外部工具呼叫失敗
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("無法啟動 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("等待 {program} 結束失敗: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} 執行逾時（{} 秒），已終止", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} 執行失敗 ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} 未產生輸出檔案: {path}")]
    MissingOutput { program: String, path: String },
}

/// 執行外部工具並限制最長執行時間
///
/// stdout/stderr 由背景執行緒讀取，避免管線緩衝區塞滿造成子程序卡住。
/// 超過 `timeout` 時終止子程序並回傳 [`ToolError::TimedOut`]。
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<ToolOutput, ToolError> {
    let program = command.get_program().to_string_lossy().to_string();

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("執行外部工具: {command:?}");

    let mut child = command.spawn().map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                kill_child(&mut child, &program);
                return Err(ToolError::Wait { program, source });
            }
        }

        if started.elapsed() >= timeout {
            warn!("{program} 執行超過 {} 秒，終止程序", timeout.as_secs());
            kill_child(&mut child, &program);
            // 孫程序可能仍持有管線，讀取執行緒交由其自行結束
            drop(stdout_reader);
            drop(stderr_reader);
            return Err(ToolError::TimedOut { program, timeout });
        }

        thread::sleep(POLL_INTERVAL);
    };

    let output = ToolOutput {
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    };

    if !status.success() {
        return Err(ToolError::Failed {
            program,
            status: status.to_string(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<String>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).to_string()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_child(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        warn!("無法終止 {program}: {e}");
    }
    let _ = child.wait();
}
