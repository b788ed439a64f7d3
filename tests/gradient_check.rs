use approx::assert_abs_diff_eq;
use rmlp::core::losses::criteria;
use rmlp::{matrix, Activation, Loss, Matrix, Network, NetworkConfig};

const H: f64 = 1e-5;

fn loss_at(net: &Network, x: &Matrix, y: &Matrix) -> f64 {
    criteria(&net.predict(x).unwrap(), y, net.loss()).unwrap()
}

#[derive(Clone, Copy)]
enum Param {
    Weight,
    Bias,
}

fn nudge(net: &mut Network, layer: usize, param: Param, idx: usize, by: f64) {
    let (w, b) = net.layer_mut(layer).unwrap().parameters_mut();
    match param {
        Param::Weight => w[idx] += by,
        Param::Bias => b[idx] += by,
    }
}

fn numeric(net: &mut Network, layer: usize, param: Param, idx: usize, x: &Matrix, y: &Matrix) -> f64 {
    nudge(net, layer, param, idx, H);
    let up = loss_at(net, x, y);
    nudge(net, layer, param, idx, -2.0 * H);
    let down = loss_at(net, x, y);
    nudge(net, layer, param, idx, H);
    (up - down) / (2.0 * H)
}

fn check(config: NetworkConfig, x: Matrix, y: Matrix) {
    let mut net = Network::new(&config).unwrap();
    let grads = net.gradients(&net.forward(&x).unwrap(), &y).unwrap();
    assert_eq!(grads.len(), net.num_layers());

    for (layer, g) in grads.iter().enumerate() {
        for (idx, analytic) in g.weights.as_slice().iter().enumerate() {
            let estimate = numeric(&mut net, layer, Param::Weight, idx, &x, &y);
            assert_abs_diff_eq!(*analytic, estimate, epsilon = 1e-6);
        }
        for (idx, analytic) in g.biases.iter().enumerate() {
            let estimate = numeric(&mut net, layer, Param::Bias, idx, &x, &y);
            assert_abs_diff_eq!(*analytic, estimate, epsilon = 1e-6);
        }
    }
}

#[test]
fn relu_sigmoid_mse_matches_finite_differences() {
    check(
        NetworkConfig::new(2)
            .add_dense(3, Activation::Relu)
            .add_dense(1, Activation::Sigmoid)
            .loss(Loss::Mse)
            .seed(3),
        matrix![[0.3, -0.7], [1.2, 0.4], [-0.5, 0.9]].unwrap(),
        matrix![[1.0], [0.0], [1.0]].unwrap(),
    );
}

#[test]
fn deeper_tanh_network_matches_finite_differences() {
    check(
        NetworkConfig::new(3)
            .add_dense(4, Activation::Tanh)
            .add_dense(3, Activation::LeakyRelu)
            .add_dense(2, Activation::Sigmoid)
            .loss(Loss::Mse)
            .seed(17),
        matrix![[0.1, 0.2, 0.3], [-0.4, 0.5, -0.6]].unwrap(),
        matrix![[0.0, 1.0], [1.0, 0.5]].unwrap(),
    );
}
