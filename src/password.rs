// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::{
    error::{self, Result},
    metadata,
};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    account: String,
    error: Option<String>,
}

pub(crate) struct RequestBuilder {
    account: String,
    error: Option<String>,
}

impl RequestBuilder {
    pub(crate) fn new(account: &str) -> Self {
        Self {
            account: account.to_owned(),
            error: None,
        }
    }

    pub(crate) fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_owned());
        self
    }

    pub(crate) fn into_request(self) -> Request {
        Request {
            account: self.account,
            error: self.error,
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

/// Prompts until one of the prompts answers, failing when none can.
pub(crate) async fn require(prompt: &dyn Prompt, req: Request) -> Result<SecretString> {
    prompt
        .prompt(req)
        .await?
        .ok_or_else(|| error::Password::NoPrompt.into())
}

pub(crate) struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub(crate) const fn new() -> Self {
        Self { executable: None }
    }

    pub(crate) fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            description: &'input str,
            error: Option<&'input String>,
        ) -> Result<SecretString> {
            _ = input.required("You must enter your password to log in.");
            _ = input.with_title(title);
            _ = input.with_description(description);
            _ = input.with_prompt("Password");
            if let Some(e) = error {
                _ = input.with_error(e);
            }

            Ok(input.interact()?)
        }

        let title = format!("Log in - {}", *metadata::CLIENT_DISPLAY_NAME);
        let description = format!("Enter the password for {}.", req.account);

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| {
                task::spawn_blocking(move || {
                    interact(input, &title, &description, req.error.as_ref())
                })
            });

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        if let Some(error) = req.error {
            eprintln!("Error: {error}");
        }

        let label = format!("Password for {}: ", req.account);
        Ok(Some(
            task::spawn_blocking(move || rpassword::prompt_password(label).map(SecretString::new))
                .await??,
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::SecretString;

    use crate::error::Result;

    use super::{Prompt, Request};

    /// Answers with queued passwords and remembers the errors it was shown.
    #[derive(Default)]
    pub(crate) struct Scripted {
        answers: Mutex<Vec<String>>,
        errors: Mutex<Vec<Option<String>>>,
    }

    impl Scripted {
        pub(crate) fn new(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().map(|&a| a.to_owned()).collect()),
                errors: Mutex::default(),
            }
        }

        pub(crate) fn errors(&self) -> Vec<Option<String>> {
            self.errors.lock().expect("errors lock").clone()
        }
    }

    #[async_trait]
    impl Prompt for Scripted {
        async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
            self.errors.lock().expect("errors lock").push(req.error);
            Ok(self
                .answers
                .lock()
                .expect("answers lock")
                .pop()
                .map(SecretString::new))
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret as _;

    use super::{testing::Scripted, *};

    struct Silent;

    #[async_trait]
    impl Prompt for Silent {
        async fn prompt(&self, _req: Request) -> Result<Option<SecretString>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn falls_through_to_next_prompt() -> Result<()> {
        let chain: Vec<Box<dyn Prompt>> = vec![Box::new(Silent), Box::new(Scripted::new(&["pw"]))];
        let password = require(&chain, RequestBuilder::new("a@b.com").into_request()).await?;
        assert_eq!(password.expose_secret(), "pw");
        Ok(())
    }

    #[tokio::test]
    async fn no_answer_is_an_error() {
        let chain: Vec<Box<dyn Prompt>> = vec![Box::new(Silent)];
        let err = require(&chain, RequestBuilder::new("a@b.com").into_request())
            .await
            .expect_err("nobody answered");
        assert!(matches!(err, error::Error::Password(error::Password::NoPrompt)));
    }
}
