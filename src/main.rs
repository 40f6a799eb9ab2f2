use dyne::{App, Request, Response, Settings};

fn main() -> dyne::Result<()> {
    let settings = Settings::load(None)?;
    let mut app = App::with_settings(settings);

    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("hello, world!");
        Ok(resp)
    });

    app.run()
}
