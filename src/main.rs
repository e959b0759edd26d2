// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! hrq CLI - send one request and print the decoded response

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context};
use hrq::{Payload, Request, Response};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hrq=info".parse().expect("static directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "get" | "head" | "delete" | "options" | "post" | "put" => {
            if args.len() < 3 {
                eprintln!("Usage: hrq {} <url>", args[1]);
                return ExitCode::from(1);
            }
            run(&args[1], &args[2], &args[3..]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("hrq {}", hrq::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"hrq - fluent HTTP requests

USAGE:
    hrq <METHOD> <url> [key=value ...] [OPTIONS]

METHODS:
    get, head, delete, options     Send without a body
    post, put                      Send key=value fields as the body

OPTIONS:
    --json          Encode fields as a JSON object
    --gzip          Compress the request body with gzip
    -H name:value   Add a request header
    -b name=value   Add a request cookie

EXAMPLES:
    hrq get https://example.com
    hrq post https://example.com/login user=kalle password=secret
    hrq put https://example.com/api/item name=box --json --gzip
"#
    );
}

async fn run(method: &str, url: &str, rest: &[String]) -> anyhow::Result<()> {
    let mut request = match method {
        "get" => Request::get(url),
        "head" => Request::head(url),
        "delete" => Request::delete(url),
        "options" => Request::options(url),
        "post" => Request::post(url),
        _ => Request::put(url),
    }
    .with_context(|| format!("invalid request for {}", url))?;

    let mut fields = Vec::new();
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => request = request.set_json(),
            "--gzip" => request = request.use_gzip(),
            "-H" => {
                let Some((name, value)) = iter.next().and_then(|h| h.split_once(':')) else {
                    bail!("-H expects name:value");
                };
                request = request.set_header(name.trim(), value.trim());
            }
            "-b" => {
                let Some((name, value)) = iter.next().and_then(|c| c.split_once('=')) else {
                    bail!("-b expects name=value");
                };
                request = request.put_cookie(name, value);
            }
            field => match field.split_once('=') {
                Some((k, v)) => fields.push((k.to_string(), v.to_string())),
                None => bail!("unexpected argument: {}", field),
            },
        }
    }
    if !fields.is_empty() {
        request = request.payload(Payload::form(fields));
    }

    let response = request.send().await?;
    print_response(&response).await
}

async fn print_response(response: &Response) -> anyhow::Result<()> {
    for hop in response.history() {
        println!("{} {}", hop.status.as_u16(), hop.url);
    }
    println!("{} {}", response.status(), response.url());
    for (name, value) in response.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();

    let encoding = response.encoding().await?;
    tracing::debug!(%encoding, "decoding response body");
    println!("{}", response.text().await?);
    Ok(())
}
