//! kaniko executor の実行
//!
//! executor をサブプロセスとして起動し、標準出力と標準エラーをそのまま中継します。

use crate::error::{BuildError, BuildResult};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

/// kaniko executor の既定パス
pub const DEFAULT_EXECUTOR: &str = "/kaniko/executor";

#[derive(Debug, Clone)]
pub struct Executor {
    bin: PathBuf,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self {
            bin: PathBuf::from(DEFAULT_EXECUTOR),
        }
    }

    pub fn with_bin(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// トラブルシューティング用に executor のバージョンを出力
    pub async fn version(&self) -> BuildResult<()> {
        tracing::trace!("creating kaniko version command");
        self.run(&["version"]).await
    }

    /// executor を実行し、出力をこのプロセスの stdout/stderr に中継
    pub async fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> BuildResult<()> {
        // 実行するコマンドを CI ログに残す
        println!("$ {}", self.command_line(args));

        self.stream_to(args, tokio::io::stdout(), tokio::io::stderr())
            .await?;
        Ok(())
    }

    /// executor を実行し、出力を指定した書き込み先へ流す
    ///
    /// stdout はバックグラウンドタスク、stderr は呼び出し元タスクで読み出し、
    /// 両方の完了を待ってから終了ステータスを確認します。
    pub async fn stream_to<S, O, E>(&self, args: &[S], stdout: O, stderr: E) -> BuildResult<(O, E)>
    where
        S: AsRef<OsStr>,
        O: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        tracing::trace!("executing cmd {}", self.command_line(args));

        let mut child = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::ExecutorSpawn {
                bin: self.bin.clone(),
                source,
            })?;

        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        let stdout_task = tokio::spawn(drain(child_stdout, stdout));
        let stderr_result = drain(child_stderr, stderr).await;
        let stdout_result = stdout_task
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|r| r);

        let status = child.wait().await?;
        if !status.success() {
            return Err(BuildError::ExecutorFailed { status });
        }

        let stdout = stdout_result.map_err(|source| BuildError::StreamCopy {
            stream: "stdout",
            source,
        })?;
        let stderr = stderr_result.map_err(|source| BuildError::StreamCopy {
            stream: "stderr",
            source,
        })?;

        Ok((stdout, stderr))
    }

    fn command_line<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        std::iter::once(self.bin.as_os_str())
            .chain(args.iter().map(AsRef::as_ref))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

async fn drain<R, W>(reader: Option<R>, mut writer: W) -> std::io::Result<W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(mut reader) = reader {
        tokio::io::copy(&mut reader, &mut writer).await?;
    }
    writer.flush().await?;
    Ok(writer)
}
