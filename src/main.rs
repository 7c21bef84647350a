use varicell::{catalog, Alternatives, Variant, Visit, Visitor};

type Value = catalog![i64, f64, String];

fn main() {
    let mut v: Variant<Value> = Variant::new(42i64);
    println!("{v:?} holds {:?}", v.type_name());

    v.set(String::from("hi"));
    println!("{v:?} holds {:?}", v.type_name());
    if let Err(e) = v.get::<i64, _>() {
        println!("get::<i64> failed: {e}");
    }

    let v2 = v.take();
    println!("after take: {v:?} and {v2:?}");
    println!("{}", v2.visit(Describe).unwrap_or_default());

    for token in [Token::Number(2.5), Token::Word(String::from("let"))] {
        let cleaved = token.cleave();
        println!("cleaved into {cleaved:?}");
        let reknitted = Token::reknit(cleaved);
        println!("{reknitted:?}");
    }
}

struct Describe;

impl Visitor for Describe {
    type Output = String;
}

impl Visit<i64> for Describe {
    fn visit(&mut self, value: &i64) -> String {
        format!("an integer: {value}")
    }
}

impl Visit<f64> for Describe {
    fn visit(&mut self, value: &f64) -> String {
        format!("a float: {value}")
    }
}

impl Visit<String> for Describe {
    fn visit(&mut self, value: &String) -> String {
        format!("some text: {value:?}")
    }
}

#[derive(Alternatives, Debug)]
enum Token {
    Number(f64),
    Word(String),
}
