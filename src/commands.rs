use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, map, value},
    sequence::{delimited, preceded, separated_pair},
    Finish, IResult,
};

/// What can be typed on the console while streamwatch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'input> {
    Add(&'input str),
    Remove(&'input str),
    Refresh,
    AutoOpen(bool),
    /// client id then client secret
    Credentials(&'input str, &'input str),
    List,
    Quit,
}

pub const USAGE: &str = "commands: add <channel>, remove <channel>, refresh, autoopen on|off, \
     credentials <client id> <client secret>, list, quit";

pub fn parse_command(input: &str) -> Result<Command<'_>, String> {
    all_consuming(delimited(multispace0, command, multispace0))(input)
        .finish()
        .map(|x| x.1)
        .map_err(|e| format!("Cannot parse {:?} at {:?}", input.trim(), e.input))
}

fn command(input: &str) -> IResult<&str, Command<'_>> {
    alt((
        map(with_argument(tag("add"), channel_name), Command::Add),
        map(
            with_argument(alt((tag("remove"), tag("rm"))), channel_name),
            Command::Remove,
        ),
        map(
            with_argument(tag("autoopen"), switch),
            Command::AutoOpen,
        ),
        map(
            with_argument(
                tag("credentials"),
                separated_pair(token, multispace1, token),
            ),
            |(id, secret)| Command::Credentials(id, secret),
        ),
        value(Command::Refresh, tag("refresh")),
        value(Command::List, alt((tag("list"), tag("ls")))),
        value(Command::Quit, alt((tag("quit"), tag("exit")))),
    ))(input)
}

fn with_argument<'a, C, A, O>(
    cmd: C,
    argument: A,
) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    C: FnMut(&'a str) -> IResult<&'a str, &'a str>,
    A: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(cmd, preceded(multispace1, argument))
}

/// Twitch logins are made of ascii letters, digits and underscores.
fn channel_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n")(input)
}

fn switch(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("on")), value(false, tag("off"))))(input)
}
